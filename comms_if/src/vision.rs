//! # Perception observation interface
//!
//! The vision pipeline (camera, detector, ground-plane projection) is an
//! external collaborator. The controller only ever sees the observation
//! defined here, produced once per perception tick.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pixel-space location of the currently tracked target.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TargetObs {
    /// Target centre, horizontal.
    ///
    /// Units: pixels
    pub cx: f64,

    /// Target centre, vertical.
    ///
    /// Units: pixels
    pub cy: f64,
}

/// Dimensions of the camera frame the target was detected in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FrameDims {
    /// Units: pixels
    pub width: u32,

    /// Units: pixels
    pub height: u32,
}

/// One perception observation, consumed by the controller each tick.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct VisionObs {
    /// Monotonic time at which the observation was made, or 0.0 if no
    /// perception source is attached.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    /// True when the detector has held a target for long enough to be
    /// considered stable.
    pub stable_detected: bool,

    /// The stable target, if any.
    pub stable_target: Option<TargetObs>,

    /// Dimensions of the frame `stable_target` is expressed in.
    pub frame: Option<FrameDims>,

    /// Whether the ground-plane projection of the target is valid.
    pub gp_valid: bool,

    /// Ground-plane projected forward distance to the target.
    ///
    /// Units: feet
    pub gp_fw_dist_ft: Option<f64>,
}
