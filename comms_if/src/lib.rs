//! # Communications interface crate.
//!
//! Provides the common interfaces between the robot executable, the
//! microcontroller serial link, and external collaborators (perception and
//! the dashboard).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Drive and mechanism command definitions
pub mod cmd;

/// Wire protocol encode/decode (newline-delimited JSON frames)
pub mod protocol;

/// Telemetry and link state definitions
pub mod telemetry;

/// Perception observation interface
pub mod vision;
