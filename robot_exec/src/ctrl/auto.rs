//! Auto phase tick handlers.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{
    cmd::{DriveCommand, MechanismCommand, DRIVE_STOP, MECH_NOOP},
    vision::VisionObs,
};

use util::maths::clamp;

use super::state::{CtrlInner, CtrlState};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CtrlInner {
    /// Searching: rotate in place until a stable target appears.
    pub(crate) fn tick_auto_searching(
        &mut self,
        obs: &VisionObs,
    ) -> (DriveCommand, MechanismCommand) {
        if obs.stable_detected {
            self.transition(CtrlState::AutoApproaching);
            return (DRIVE_STOP, MECH_NOOP);
        }

        let drive = DriveCommand {
            linear: 0.0,
            angular: self.params.default_speed_angular,
        };

        (drive, MECH_NOOP)
    }

    /// Approaching: proportional steering onto the held target errors.
    ///
    /// When a target is visible this tick its errors are computed and
    /// latched. The controllers then always run on the latched errors, so a
    /// brief dropout within `target_hold_s` keeps the previous correction
    /// rather than stopping dead.
    pub(crate) fn tick_auto_approaching(
        &mut self,
        now_s: f64,
        obs: &VisionObs,
    ) -> (DriveCommand, MechanismCommand) {
        // Judge recency on the observation clock when the observation
        // carries one
        let now_s = if obs.timestamp_s > 0.0 {
            obs.timestamp_s
        } else {
            now_s
        };

        if let (Some(target), Some(frame)) = (obs.stable_target, obs.frame) {
            let mut err_x = norm_shift(target.cx, frame.width as f64, self.params.x_shift);
            if err_x.abs() < self.params.deadzone_x {
                err_x = 0.0;
            }

            let gp_range_ft = if self.params.use_ground_plane_range && obs.gp_valid {
                obs.gp_fw_dist_ft
            } else {
                None
            };

            let err_y = match gp_range_ft {
                Some(gp_fw_ft) => {
                    let mut range_err_ft = gp_fw_ft - self.params.desired_range_ft;
                    if range_err_ft.abs() < self.params.deadzone_range_ft {
                        range_err_ft = 0.0;
                    }

                    self.last_range_ft = Some(gp_fw_ft);
                    self.last_range_valid = true;

                    range_err_ft
                }
                None => {
                    // Pixel-y fallback. Negated so "target below setpoint"
                    // demands forward motion.
                    let mut pixel_err_y =
                        -norm_shift(target.cy, frame.height as f64, self.params.y_shift);
                    if pixel_err_y.abs() < self.params.deadzone_y {
                        pixel_err_y = 0.0;
                    }

                    self.last_range_valid = false;

                    pixel_err_y
                }
            };

            self.last_target_seen_ts_s = Some(now_s);
            self.last_err_x = err_x;
            self.last_err_y = err_y;
        }

        let target_recent = match self.last_target_seen_ts_s {
            Some(seen_ts_s) => now_s - seen_ts_s <= self.params.target_hold_s,
            None => false,
        };

        if !target_recent {
            self.transition(CtrlState::AutoSearching);
            return (DRIVE_STOP, MECH_NOOP);
        }

        // Both errors inside their deadzones means the approach is complete
        if self.last_err_x == 0.0 && self.last_err_y == 0.0 {
            self.transition(CtrlState::AutoPickup);
            return (DRIVE_STOP, MECH_NOOP);
        }

        let angular = p_term(
            self.last_err_x,
            self.params.kp_ang,
            self.params.min_speed_angular,
            self.params.max_speed_angular,
        );

        let kp_lin = if self.params.use_ground_plane_range && self.last_range_valid {
            self.params.kp_lin_ft
        } else {
            self.params.kp_lin_pixel
        };
        let linear = p_term(
            self.last_err_y,
            kp_lin,
            self.params.min_speed_linear,
            self.params.max_speed_linear,
        );

        (DriveCommand { linear, angular }, MECH_NOOP)
    }

    /// Pickup: hold position while the mechanism sequence runs.
    pub(crate) fn tick_auto_pickup(&mut self) -> (DriveCommand, MechanismCommand) {
        (DRIVE_STOP, MECH_NOOP)
    }

    /// Deposit: hold position. Only ever entered by an explicit state force.
    pub(crate) fn tick_auto_deposit(&mut self) -> (DriveCommand, MechanismCommand) {
        (DRIVE_STOP, MECH_NOOP)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Normalise a pixel coordinate into [0, 1] and shift it about a setpoint.
fn norm_shift(pixel: f64, resolution: f64, shift: f64) -> f64 {
    if resolution <= 0.0 {
        return 0.0;
    }

    pixel / resolution - shift
}

/// Proportional controller term with output clamping.
fn p_term(err: f64, kp: f64, lo: f64, hi: f64) -> f64 {
    clamp(&(kp * err), &lo, &hi)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use comms_if::vision::{FrameDims, TargetObs};

    use super::super::params::Params;
    use super::*;

    const FRAME: FrameDims = FrameDims {
        width: 640,
        height: 480,
    };

    fn obs_with_target(cx: f64, cy: f64, gp_fw_dist_ft: Option<f64>) -> VisionObs {
        VisionObs {
            timestamp_s: 100.0,
            stable_detected: true,
            stable_target: Some(TargetObs { cx, cy }),
            frame: Some(FRAME),
            gp_valid: gp_fw_dist_ft.is_some(),
            gp_fw_dist_ft,
        }
    }

    fn auto_ctrl(state: CtrlState) -> CtrlInner {
        let mut inner = CtrlInner::new(Params::default(), 0.0);
        inner.state = state;
        inner
    }

    #[test]
    fn test_searching_rotates_until_stable() {
        let mut inner = auto_ctrl(CtrlState::AutoSearching);

        // No target: rotate in place at the default angular speed
        let (drive, mech) = inner.tick_at(0.0, &VisionObs::default(), None);
        assert_eq!(drive.linear, 0.0);
        assert_eq!(drive.angular, inner.params.default_speed_angular);
        assert_eq!(mech, MECH_NOOP);
        assert_eq!(inner.state, CtrlState::AutoSearching);

        // Stable target: stop and hand over to approaching
        let obs = obs_with_target(320.0, 408.0, None);
        let (drive, _) = inner.tick_at(0.1, &obs, None);
        assert_eq!(drive, DRIVE_STOP);
        assert_eq!(inner.state, CtrlState::AutoApproaching);
    }

    #[test]
    fn test_approach_steering_gains() {
        let mut inner = auto_ctrl(CtrlState::AutoApproaching);

        // Target at 3/4 frame width: err_x = 0.25, angular = kp_ang * 0.25.
        // Ground-plane range 2.5 ft against a 0.5 ft setpoint: err_y = 2.0,
        // clamped to max_speed_linear.
        let obs = obs_with_target(480.0, 240.0, Some(2.5));
        let (drive, _) = inner.tick_at(100.0, &obs, None);

        assert!((drive.angular - 5.0).abs() < 1e-9);
        assert!((drive.linear - inner.params.max_speed_linear).abs() < 1e-9);
        assert_eq!(inner.state, CtrlState::AutoApproaching);
        assert_eq!(inner.last_range_ft, Some(2.5));
        assert!(inner.last_range_valid);
    }

    #[test]
    fn test_approach_pixel_fallback() {
        let mut inner = auto_ctrl(CtrlState::AutoApproaching);

        // No valid ground plane: pixel-y fallback. Target at half frame
        // height, y_shift 0.85, so err_y = -(0.5 - 0.85) = 0.35 and linear
        // = kp_lin_pixel * 0.35.
        let obs = obs_with_target(480.0, 240.0, None);
        let (drive, _) = inner.tick_at(100.0, &obs, None);

        assert!((drive.linear - 0.35).abs() < 1e-9);
        assert!(!inner.last_range_valid);
    }

    #[test]
    fn test_approach_holds_errors_through_dropout() {
        let mut inner = auto_ctrl(CtrlState::AutoApproaching);

        let obs = obs_with_target(480.0, 240.0, Some(2.5));
        let (first, _) = inner.tick_at(100.0, &obs, None);

        // Target lost, still within target_hold_s: the held errors keep
        // the previous correction going
        let blind = VisionObs {
            timestamp_s: 100.2,
            ..VisionObs::default()
        };
        let (held, _) = inner.tick_at(100.2, &blind, None);
        assert_eq!(held, first);
        assert_eq!(inner.state, CtrlState::AutoApproaching);
    }

    #[test]
    fn test_approach_gives_up_after_hold_expires() {
        let mut inner = auto_ctrl(CtrlState::AutoApproaching);

        let obs = obs_with_target(480.0, 240.0, Some(2.5));
        inner.tick_at(100.0, &obs, None);

        let blind = VisionObs {
            timestamp_s: 100.6,
            ..VisionObs::default()
        };
        let (drive, _) = inner.tick_at(100.6, &blind, None);

        assert_eq!(drive, DRIVE_STOP);
        assert_eq!(inner.state, CtrlState::AutoSearching);
    }

    #[test]
    fn test_approach_never_seen_reverts_immediately() {
        let mut inner = auto_ctrl(CtrlState::AutoApproaching);

        let (drive, _) = inner.tick_at(100.0, &VisionObs::default(), None);

        assert_eq!(drive, DRIVE_STOP);
        assert_eq!(inner.state, CtrlState::AutoSearching);
    }

    #[test]
    fn test_approach_completion() {
        let mut inner = auto_ctrl(CtrlState::AutoApproaching);

        // Target centred (err_x in deadzone) and range on the setpoint
        // (range error in deadzone): approach is complete
        let obs = obs_with_target(320.0, 240.0, Some(0.55));
        let (drive, _) = inner.tick_at(100.0, &obs, None);

        assert_eq!(drive, DRIVE_STOP);
        assert_eq!(inner.state, CtrlState::AutoPickup);
    }

    #[test]
    fn test_pickup_and_deposit_hold_position() {
        let mut inner = auto_ctrl(CtrlState::AutoPickup);
        let (drive, mech) = inner.tick_at(0.0, &VisionObs::default(), None);
        assert_eq!(drive, DRIVE_STOP);
        assert_eq!(mech, MECH_NOOP);
        assert_eq!(inner.state, CtrlState::AutoPickup);

        let mut inner = auto_ctrl(CtrlState::AutoDeposit);
        let (drive, _) = inner.tick_at(0.0, &VisionObs::default(), None);
        assert_eq!(drive, DRIVE_STOP);
        assert_eq!(inner.state, CtrlState::AutoDeposit);
    }

    #[test]
    fn test_norm_shift() {
        assert!((norm_shift(480.0, 640.0, 0.5) - 0.25).abs() < 1e-9);
        assert!((norm_shift(0.0, 640.0, 0.5) + 0.5).abs() < 1e-9);

        // Degenerate resolution yields no error rather than a division blowup
        assert_eq!(norm_shift(100.0, 0.0, 0.5), 0.0);
        assert_eq!(norm_shift(100.0, -1.0, 0.5), 0.0);
    }

    #[test]
    fn test_p_term_clamping() {
        assert!((p_term(0.25, 20.0, -15.0, 15.0) - 5.0).abs() < 1e-9);
        assert!((p_term(2.0, 20.0, -15.0, 15.0) - 15.0).abs() < 1e-9);
        assert!((p_term(-2.0, 20.0, -15.0, 15.0) + 15.0).abs() < 1e-9);
    }
}
