//! # Controller module
//!
//! The mode state machine for the robot. Converts operator intent (manual
//! teleop) or perception observations (auto modes) into drive and mechanism
//! commands once per tick, then passes the drive command through the
//! ultrasonic safety gate.
//!
//! Mode/state layout:
//!
//! - `MANUAL`: operator drive intent with a deadman timeout, operator
//!   mechanism intent latched until changed.
//! - `AUTO_SEARCHING`: rotate in place until a stable target appears.
//! - `AUTO_APPROACHING`: proportional steering onto the target, using
//!   ground-plane range when available and pixel error as a fallback.
//! - `AUTO_PICKUP` / `AUTO_DEPOSIT`: hold position while the mechanism
//!   sequence runs (externally sequenced).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod auto;
mod gate;
mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::{Ctrl, CtrlError, CtrlState, CtrlStatusReport, UltrasonicGateReport};
