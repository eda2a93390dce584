//! Bench helper which dumps raw serial traffic from the microcontroller.
//!
//! Opens the given port (or the first discovered robot port), then prints
//! every received line for ten seconds along with whether it decodes as a
//! valid telemetry frame. No commands are ever sent.
//!
//! Usage:
//!
//! ```text
//! debug_serial_rx [PORT]
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use comms_if::protocol;
use robot_lib::ports;
use robot_lib::serial_link::{SerialPortTransport, Transport};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const BAUD: u32 = 115_200;

const TIMEOUT_S: f64 = 0.2;

/// How long to listen before exiting.
const RUN_TIME_S: f64 = 10.0;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    let port = std::env::args()
        .nth(1)
        .or_else(ports::find_robot_port)
        .ok_or_else(|| eyre!("No port given and no serial port discovered"))?;

    let mut transport = SerialPortTransport::open(&port, BAUD, TIMEOUT_S, TIMEOUT_S)
        .wrap_err_with(|| format!("Could not open {}", port))?;

    println!("Opened {} at {} baud", port, BAUD);

    let start = Instant::now();
    let mut line_buf: Vec<u8> = Vec::new();
    let mut read_buf = [0u8; 512];

    while start.elapsed().as_secs_f64() < RUN_TIME_S {
        let num_read = transport.read(&mut read_buf)?;

        if num_read == 0 {
            println!("RX: <none>");
            thread::sleep(Duration::from_millis(200));
            continue;
        }

        line_buf.extend_from_slice(&read_buf[..num_read]);

        while let Some(newline_pos) = line_buf.iter().position(|&b| b == b'\n') {
            let raw_line: Vec<u8> = line_buf.drain(..=newline_pos).collect();
            let line = protocol::safe_decode_line(&raw_line);

            println!("RX: {:?}", line.trim_end());

            match protocol::decode_telemetry_line(&line) {
                Some(telemetry) => println!(
                    "    decoded: ack_seq {} arduino_time_ms {}",
                    telemetry.ack_seq, telemetry.arduino_time_ms
                ),
                None => println!("    not a telemetry frame"),
            }
        }
    }

    Ok(())
}
