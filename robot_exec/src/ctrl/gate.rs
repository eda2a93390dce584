//! Ultrasonic safety gate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{cmd::DriveCommand, telemetry::Telemetry};

use super::state::CtrlInner;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CtrlInner {
    /// Gate a drive command on the latest ultrasonic reading.
    ///
    /// A hysteresis latch blocks forward motion once the range drops to
    /// `ultrasonic_stop_in` and holds the block until the range recovers
    /// past `stop + release`. While blocked, the linear demand is clamped
    /// to at most zero; reverse and rotation always pass.
    ///
    /// The gate is inactive, passing the command unmodified, when disabled,
    /// when no telemetry exists, when telemetry is older than
    /// `ultrasonic_stale_s`, or when the reading is missing or invalid. A
    /// stale or invalid reading also drops the latch, since holding a block
    /// on dead data would strand the robot.
    pub(crate) fn apply_ultrasonic_gate(
        &mut self,
        drive: DriveCommand,
        telemetry: Option<&Telemetry>,
    ) -> DriveCommand {
        if !self.params.ultrasonic_enabled {
            return drive;
        }

        let telemetry = match telemetry {
            Some(t) => t,
            None => return drive,
        };

        let stale = matches!(
            telemetry.rx_age_s,
            Some(age_s) if age_s > self.params.ultrasonic_stale_s
        );
        if stale {
            self.clear_reading();
            return drive;
        }

        let distance_in = match telemetry.ultrasonic {
            Some(u) if u.valid => match u.distance_in {
                Some(d) => d,
                None => {
                    self.clear_reading();
                    return drive;
                }
            },
            _ => {
                self.clear_reading();
                return drive;
            }
        };

        self.last_ultra_valid = true;
        self.last_ultra_in = Some(distance_in);

        if self.ultra_blocked {
            if distance_in >= self.params.ultrasonic_stop_in + self.params.ultrasonic_release_in {
                self.ultra_blocked = false;
            }
        } else if distance_in <= self.params.ultrasonic_stop_in {
            self.ultra_blocked = true;
        }

        if self.ultra_blocked {
            DriveCommand {
                linear: drive.linear.min(0.0),
                angular: drive.angular,
            }
        } else {
            drive
        }
    }

    fn clear_reading(&mut self) {
        self.last_ultra_valid = false;
        self.last_ultra_in = None;
        self.ultra_blocked = false;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use comms_if::telemetry::{Telemetry, UltrasonicState};

    use super::super::params::Params;
    use super::*;

    fn telemetry_with_range(distance_in: Option<f64>, valid: bool, rx_age_s: f64) -> Telemetry {
        Telemetry {
            arduino_time_ms: 0,
            ack_seq: 0,
            wheel: None,
            mech: None,
            ultrasonic: Some(UltrasonicState { distance_in, valid }),
            note: None,
            host_rx_time_s: 0.0,
            rx_age_s: Some(rx_age_s),
        }
    }

    fn gated_ctrl() -> CtrlInner {
        CtrlInner::new(Params::default(), 0.0)
    }

    const FORWARD: DriveCommand = DriveCommand {
        linear: 0.5,
        angular: 2.0,
    };

    #[test]
    fn test_hysteresis_sequence() {
        // stop at 12 in, release at 15 in
        let mut inner = gated_ctrl();

        let expected = [
            (20.0, false),
            (10.0, true),
            (8.0, true),
            (13.0, true), // above stop but below release, latch holds
            (16.0, false),
        ];

        for &(distance_in, blocked) in &expected {
            let telemetry = telemetry_with_range(Some(distance_in), true, 0.0);
            let drive = inner.apply_ultrasonic_gate(FORWARD, Some(&telemetry));

            assert_eq!(inner.ultra_blocked, blocked, "at {} in", distance_in);
            assert_eq!(
                drive.linear,
                if blocked { 0.0 } else { FORWARD.linear },
                "at {} in",
                distance_in
            );
            // Rotation always passes
            assert_eq!(drive.angular, FORWARD.angular);
        }
    }

    #[test]
    fn test_blocked_at_exact_stop_threshold() {
        let mut inner = gated_ctrl();

        let telemetry = telemetry_with_range(Some(12.0), true, 0.0);
        inner.apply_ultrasonic_gate(FORWARD, Some(&telemetry));
        assert!(inner.ultra_blocked);

        // Exactly at stop + release is enough to let go
        let telemetry = telemetry_with_range(Some(15.0), true, 0.0);
        inner.apply_ultrasonic_gate(FORWARD, Some(&telemetry));
        assert!(!inner.ultra_blocked);
    }

    #[test]
    fn test_reverse_passes_while_blocked() {
        let mut inner = gated_ctrl();

        let telemetry = telemetry_with_range(Some(5.0), true, 0.0);
        let reverse = DriveCommand {
            linear: -0.5,
            angular: 1.0,
        };
        let drive = inner.apply_ultrasonic_gate(reverse, Some(&telemetry));

        assert!(inner.ultra_blocked);
        assert_eq!(drive, reverse);
    }

    #[test]
    fn test_stale_telemetry_bypasses_and_unlatches() {
        let mut inner = gated_ctrl();

        let telemetry = telemetry_with_range(Some(5.0), true, 0.0);
        inner.apply_ultrasonic_gate(FORWARD, Some(&telemetry));
        assert!(inner.ultra_blocked);

        let stale = telemetry_with_range(Some(5.0), true, 1.0);
        let drive = inner.apply_ultrasonic_gate(FORWARD, Some(&stale));

        assert!(!inner.ultra_blocked);
        assert!(!inner.last_ultra_valid);
        assert_eq!(inner.last_ultra_in, None);
        assert_eq!(drive, FORWARD);
    }

    #[test]
    fn test_invalid_reading_bypasses_and_unlatches() {
        let mut inner = gated_ctrl();

        let telemetry = telemetry_with_range(Some(5.0), true, 0.0);
        inner.apply_ultrasonic_gate(FORWARD, Some(&telemetry));
        assert!(inner.ultra_blocked);

        let invalid = telemetry_with_range(None, false, 0.0);
        let drive = inner.apply_ultrasonic_gate(FORWARD, Some(&invalid));

        assert!(!inner.ultra_blocked);
        assert_eq!(drive, FORWARD);
    }

    #[test]
    fn test_missing_telemetry_bypasses_but_keeps_latch() {
        let mut inner = gated_ctrl();

        let telemetry = telemetry_with_range(Some(5.0), true, 0.0);
        inner.apply_ultrasonic_gate(FORWARD, Some(&telemetry));
        assert!(inner.ultra_blocked);

        // With no telemetry at all the gate is inactive but the latch is
        // left alone, ready for the next reading
        let drive = inner.apply_ultrasonic_gate(FORWARD, None);
        assert!(inner.ultra_blocked);
        assert_eq!(drive, FORWARD);
    }

    #[test]
    fn test_disabled_gate_is_inert() {
        let mut inner = gated_ctrl();
        inner.params.ultrasonic_enabled = false;

        let telemetry = telemetry_with_range(Some(1.0), true, 0.0);
        let drive = inner.apply_ultrasonic_gate(FORWARD, Some(&telemetry));

        assert!(!inner.ultra_blocked);
        assert_eq!(drive, FORWARD);
    }
}
