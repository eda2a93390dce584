//! Parameters structure for the executable itself

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters controlling the main loop scheduling.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecParams {
    /// Frequency at which the controller is ticked.
    ///
    /// Units: hertz
    pub ctrl_hz: f64,

    /// Frequency at which the serial link is ticked.
    ///
    /// Units: hertz
    pub comms_hz: f64,
}
