//! # Telemetry and link state definitions
//!
//! Host-side representation of what the microcontroller sends back
//! (telemetry frames), plus link health metadata owned by the serial link.
//!
//! These types are not sent over the wire directly - the wire carries
//! newline-delimited JSON which [`crate::protocol`] decodes into them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Wheel speed feedback from the microcontroller.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct WheelState {
    /// Left wheel speed.
    ///
    /// Units: revolutions/minute
    pub left_rpm: f64,

    /// Right wheel speed.
    ///
    /// Units: revolutions/minute
    pub right_rpm: f64,
}

/// Mechanism state feedback from the microcontroller.
///
/// Servo angles are in degrees (0-180 typical), motor angles are
/// encoder-derived degrees and may be any real number.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct MechanismState {
    #[serde(rename = "servo_LID_deg")]
    pub servo_lid_deg: Option<f64>,

    #[serde(rename = "servo_SWEEP_deg")]
    pub servo_sweep_deg: Option<f64>,

    #[serde(rename = "motor_RHS_deg")]
    pub motor_rhs_deg: Option<f64>,

    #[serde(rename = "motor_LHS_deg")]
    pub motor_lhs_deg: Option<f64>,
}

/// Ultrasonic distance feedback from the microcontroller.
///
/// Invariant: `distance_in` is `None` whenever `valid` is false. The decoder
/// enforces this even if the wire payload violates it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct UltrasonicState {
    /// Measured range to the nearest obstacle.
    ///
    /// Units: inches
    pub distance_in: Option<f64>,

    /// Whether the reading is trustworthy (no timeout/out-of-range).
    pub valid: bool,
}

/// A full telemetry frame (microcontroller -> host).
///
/// `host_rx_time_s` and `rx_age_s` are filled in host-side by the serial
/// link, never by the decoder.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Telemetry {
    /// Microcontroller millis() timestamp.
    pub arduino_time_ms: i64,

    /// Last command sequence number the microcontroller has applied. Acts as
    /// an implicit ACK.
    pub ack_seq: i64,

    pub wheel: Option<WheelState>,

    pub mech: Option<MechanismState>,

    pub ultrasonic: Option<UltrasonicState>,

    /// Optional free-form debug string from the firmware.
    pub note: Option<String>,

    /// Host monotonic time at which this frame was received.
    ///
    /// Units: seconds
    pub host_rx_time_s: f64,

    /// Age of this frame, recomputed continuously by the serial link.
    ///
    /// Units: seconds
    pub rx_age_s: Option<f64>,
}

/// Link statistics for debugging and dashboard display.
///
/// Purely host-side state, lives for the lifetime of the serial link.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LinkStats {
    /// Current link health state.
    pub state: LinkState,

    /// The port in use (or last attempted).
    pub port: Option<String>,

    /// The baud rate in use.
    pub baud: Option<u32>,

    /// Sequence number of the last transmission attempt.
    ///
    /// Monotonically increasing from 1, incremented once per attempt. Not a
    /// gap-free count of delivered frames: an attempt whose write fails still
    /// consumes a sequence number.
    pub tx_seq: u64,

    /// Last `ack_seq` reported by the microcontroller. Hardware is trusted,
    /// so this is never validated against `tx_seq`.
    pub last_ack_seq: Option<i64>,

    pub bytes_tx: u64,
    pub bytes_rx: u64,

    /// Host monotonic time of the last successful transmit.
    pub last_tx_time_s: Option<f64>,

    /// Host monotonic time of the last valid telemetry frame.
    pub last_rx_time_s: Option<f64>,

    /// Host monotonic time at which the link was last considered healthy.
    pub last_ok_time_s: Option<f64>,

    /// The last transport error, as "kind: message".
    pub last_error: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// High-level health state for the serial connection.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,

    /// Connected but telemetry is too old.
    Stale,

    Error,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for LinkState {
    fn default() -> Self {
        LinkState::Disconnected
    }
}
