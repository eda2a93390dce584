//! Parameters structure for the serial link

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Serial link parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Master switch. When false the link closes any open port and every
    /// tick is a no-op.
    pub comms_enabled: bool,

    /// Explicit port to use. When `None` and `auto_detect` is true the port
    /// is discovered from USB hints instead.
    pub port: Option<String>,

    /// Units: bits per second
    pub baud: u32,

    /// Read timeout applied to each transport read.
    ///
    /// Units: seconds
    pub timeout_s: f64,

    /// Write timeout applied to each transport write.
    ///
    /// Units: seconds
    pub write_timeout_s: f64,

    /// Whether to discover the port from USB hints when none is configured.
    pub auto_detect: bool,

    /// Receive age beyond which an open link is considered stale.
    ///
    /// Units: seconds
    pub rx_stale_s: f64,

    /// Minimum time between reconnect attempts.
    ///
    /// Units: seconds
    pub reconnect_s: f64,

    /// Smoothing factor for the tick/rx/tx rate estimates, in (0, 1].
    pub hz_alpha: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            comms_enabled: true,
            port: None,
            baud: 115_200,
            timeout_s: 0.05,
            write_timeout_s: 0.05,
            auto_detect: true,
            rx_stale_s: 0.5,
            reconnect_s: 1.0,
            hz_alpha: 0.2,
        }
    }
}
