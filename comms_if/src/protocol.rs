//! # Wire protocol encode/decode
//!
//! The microcontroller link carries newline-delimited JSON frames, one
//! object per line:
//! - host -> device: full command frames, including a monotonic `seq`
//! - device -> host: full telemetry frames, including `ack_seq` (the last
//!   `seq` applied) as an implicit ACK
//!
//! This module does no serial I/O - the serial link owns the port.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde_json::{json, Value};

use crate::cmd::{DriveCommand, MechanismCommand};
use crate::telemetry::{MechanismState, Telemetry, UltrasonicState, WheelState};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Frame type string for command frames.
pub const CMD_TYPE: &str = "cmd";

/// Frame type string for telemetry frames.
pub const TEL_TYPE: &str = "telemetry";

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Encode a full command frame as one newline-terminated JSON line.
///
/// Pure and total: every drive/mechanism command encodes to a valid frame.
pub fn encode_command_frame(
    seq: u64,
    host_time_ms: i64,
    drive: &DriveCommand,
    mech: &MechanismCommand,
) -> Vec<u8> {
    let frame = json!({
        "type": CMD_TYPE,
        "seq": seq,
        "host_time_ms": host_time_ms,
        "drive": drive,
        "mech": mech,
    });

    let mut bytes = frame.to_string().into_bytes();
    bytes.push(b'\n');
    bytes
}

/// Decode one telemetry JSON line from the microcontroller.
///
/// Returns `None`, never an error, for anything malformed: empty lines,
/// invalid JSON, non-object payloads, a wrong or missing `type`, or missing
/// or non-numeric `arduino_time_ms`/`ack_seq`. A malformed optional
/// sub-object (`wheel`, `mech`, `ultrasonic`) decodes to `None` for that
/// sub-object only and does not reject the frame.
pub fn decode_telemetry_line(line: &str) -> Option<Telemetry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let obj: Value = serde_json::from_str(line).ok()?;
    let obj = obj.as_object()?;

    if obj.get("type").and_then(Value::as_str) != Some(TEL_TYPE) {
        return None;
    }

    let arduino_time_ms = value_as_int(obj.get("arduino_time_ms")?)?;
    let ack_seq = value_as_int(obj.get("ack_seq")?)?;

    let note = obj
        .get("note")
        .filter(|v| !v.is_null())
        .map(|v| match v.as_str() {
            Some(s) => s.to_owned(),
            None => v.to_string(),
        });

    Some(Telemetry {
        arduino_time_ms,
        ack_seq,
        wheel: decode_wheel(obj.get("wheel")),
        mech: decode_mech(obj.get("mech")),
        ultrasonic: decode_ultrasonic(obj.get("ultrasonic")),
        note,
        host_rx_time_s: 0.0,
        rx_age_s: None,
    })
}

/// Convert raw bytes from the serial port into a safe UTF-8 string.
///
/// Transport noise (e.g. a device reset) can emit non-text bytes, so invalid
/// sequences are replaced rather than rejected.
pub fn safe_decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Interpret a JSON value as an integer, truncating floats like the firmware
/// tooling does. Strings and other types are non-numeric.
fn value_as_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(_) => v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

fn value_as_float(v: &Value) -> Option<f64> {
    match v {
        Value::Number(_) => v.as_f64(),
        _ => None,
    }
}

fn decode_wheel(w: Option<&Value>) -> Option<WheelState> {
    let w = w?.as_object()?;

    Some(WheelState {
        left_rpm: value_as_float(w.get("left_rpm")?)?,
        right_rpm: value_as_float(w.get("right_rpm")?)?,
    })
}

fn decode_mech(m: Option<&Value>) -> Option<MechanismState> {
    let m = m?.as_object()?;

    // Individual fields are tolerant: a non-numeric entry decodes to None
    // without rejecting the rest of the sub-object.
    let f = |key: &str| m.get(key).and_then(value_as_float);

    Some(MechanismState {
        servo_lid_deg: f("servo_LID_deg"),
        servo_sweep_deg: f("servo_SWEEP_deg"),
        motor_rhs_deg: f("motor_RHS_deg"),
        motor_lhs_deg: f("motor_LHS_deg"),
    })
}

fn decode_ultrasonic(u: Option<&Value>) -> Option<UltrasonicState> {
    let u = u?.as_object()?;

    let mut valid = u.get("valid").and_then(Value::as_bool).unwrap_or(false);

    let distance_in = match u.get("distance_in") {
        Some(v) if !v.is_null() => {
            let d = value_as_float(v);
            if d.is_none() {
                valid = false;
            }
            d
        }
        _ => None,
    };

    // Enforce the invariant: no distance unless the reading is valid
    let distance_in = if valid { distance_in } else { None };

    Some(UltrasonicState { distance_in, valid })
}
