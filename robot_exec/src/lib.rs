//! Library portion of the robot executable.
//!
//! Contains the two core modules of the command-and-safety loop:
//!
//! - [`serial_link`]: owns the microcontroller transport, drains telemetry
//!   and sends command frames, tracking link health.
//! - [`ctrl`]: the operating mode state machine turning operator intent and
//!   perception observations into drive/mechanism commands, gated by the
//!   ultrasonic safety interlock.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod ctrl;
pub mod params;
pub mod ports;
pub mod serial_link;
