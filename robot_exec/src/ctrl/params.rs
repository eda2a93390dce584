//! Parameters structure for the controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Controller parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Age beyond which a manual drive command is replaced by a stop.
    ///
    /// Units: seconds
    pub deadman_s: f64,

    /// Units: normalised velocity demand
    pub default_speed_linear: f64,

    /// Rotation speed used while searching for a target.
    ///
    /// Units: normalised turn rate demand
    pub default_speed_angular: f64,

    // Output limits for the approach controllers
    pub max_speed_linear: f64,
    pub max_speed_angular: f64,
    pub min_speed_linear: f64,
    pub min_speed_angular: f64,

    /// How long the last stable target sighting remains usable before the
    /// approach gives up and reverts to searching.
    ///
    /// Units: seconds
    pub target_hold_s: f64,

    /// Proportional gain for the angular (pixel-x) controller.
    pub kp_ang: f64,

    /// Normalised pixel-x error magnitude treated as zero.
    pub deadzone_x: f64,

    /// Normalised pixel-x position of the steering setpoint.
    pub x_shift: f64,

    /// Whether the linear controller uses ground-plane range when the
    /// projection is valid. Pixel-y error is always the fallback.
    pub use_ground_plane_range: bool,

    /// Units: feet
    pub desired_range_ft: f64,

    /// Proportional gain for the range (feet) controller.
    pub kp_lin_ft: f64,

    /// Units: feet
    pub deadzone_range_ft: f64,

    /// Proportional gain for the pixel-y fallback controller.
    pub kp_lin_pixel: f64,

    /// Normalised pixel-y error magnitude treated as zero.
    pub deadzone_y: f64,

    /// Normalised pixel-y position of the approach setpoint.
    pub y_shift: f64,

    /// Master switch for the ultrasonic safety gate.
    pub ultrasonic_enabled: bool,

    /// Range at or below which forward motion is blocked.
    ///
    /// Units: inches
    pub ultrasonic_stop_in: f64,

    /// Extra range above `ultrasonic_stop_in` required to release the
    /// block. Hysteresis stops the gate chattering around the threshold.
    ///
    /// Units: inches
    pub ultrasonic_release_in: f64,

    /// Telemetry age beyond which ultrasonic readings are ignored.
    ///
    /// Units: seconds
    pub ultrasonic_stale_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            deadman_s: 0.25,
            default_speed_linear: 0.5,
            default_speed_angular: 10.0,
            max_speed_linear: 1.0,
            max_speed_angular: 15.0,
            min_speed_linear: -1.0,
            min_speed_angular: -15.0,
            target_hold_s: 0.5,
            kp_ang: 20.0,
            deadzone_x: 0.075,
            x_shift: 0.5,
            use_ground_plane_range: true,
            desired_range_ft: 0.5,
            kp_lin_ft: 1.0,
            deadzone_range_ft: 0.10,
            kp_lin_pixel: 1.0,
            deadzone_y: 0.03,
            y_shift: 0.85,
            ultrasonic_enabled: true,
            ultrasonic_stop_in: 12.0,
            ultrasonic_release_in: 3.0,
            ultrasonic_stale_s: 0.40,
        }
    }
}
