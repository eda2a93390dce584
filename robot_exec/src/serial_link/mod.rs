//! # Serial link manager
//!
//! Owns the serial transport to the robot microcontroller. Each tick the
//! link drains any waiting telemetry, sends at most one command frame, and
//! rederives the link health state. Transport faults never panic the loop;
//! they close the port and leave the link to reconnect on a later tick.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod transport;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::{LinkStatusReport, SerialLink};
pub use transport::{SerialPortTransport, Transport, TransportError};
