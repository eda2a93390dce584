//! Controller state and tick logic.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard};

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use comms_if::{
    cmd::{DriveCommand, MechUpdate, MechanismCommand, DRIVE_STOP, MECH_NOOP},
    telemetry::Telemetry,
    vision::VisionObs,
};

use super::params::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The robot's mode state machine.
///
/// All state lives behind a mutex so the main loop and any operator-facing
/// interface can share the controller.
pub struct Ctrl {
    inner: Mutex<CtrlInner>,
}

/// Snapshot of controller status for dashboard/debug display.
#[derive(Serialize, Debug, Clone)]
pub struct CtrlStatusReport {
    pub state: CtrlState,
    pub deadman_s: f64,
    pub target_hold_s: f64,
    pub ultrasonic: UltrasonicGateReport,
}

/// Snapshot of the ultrasonic safety gate.
#[derive(Serialize, Debug, Clone)]
pub struct UltrasonicGateReport {
    pub enabled: bool,
    pub blocked: bool,

    /// Latest accepted reading.
    ///
    /// Units: inches
    pub distance_in: Option<f64>,

    pub valid: bool,
    pub stop_in: f64,
    pub release_in: f64,
    pub stale_s: f64,
}

/// The actual controller state, manipulated through [`Ctrl`].
pub(crate) struct CtrlInner {
    pub(crate) params: Params,

    pub(crate) state: CtrlState,

    // Operator teleop intent, only consumed in manual mode
    pub(crate) user_cmd: DriveCommand,
    pub(crate) user_cmd_ts_s: f64,

    // Operator mechanism intent, latched until changed
    pub(crate) user_mech: MechanismCommand,
    pub(crate) user_mech_ts_s: f64,

    // Approach memory, held for up to target_hold_s after a sighting
    pub(crate) last_target_seen_ts_s: Option<f64>,
    pub(crate) last_err_x: f64,
    pub(crate) last_err_y: f64,
    pub(crate) last_range_ft: Option<f64>,
    pub(crate) last_range_valid: bool,

    // Ultrasonic gate latch and last accepted reading
    pub(crate) ultra_blocked: bool,
    pub(crate) last_ultra_in: Option<f64>,
    pub(crate) last_ultra_valid: bool,

    // Most recent outputs, for status display
    pub(crate) last_drive_cmd: DriveCommand,
    pub(crate) last_mech_cmd: MechanismCommand,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Operating state of the controller.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CtrlState {
    Manual,
    AutoSearching,
    AutoApproaching,
    AutoPickup,
    AutoDeposit,
}

#[derive(Debug, Error)]
pub enum CtrlError {
    #[error("Unknown mode \"{0}\", expected \"manual\" or \"auto\"")]
    InvalidMode(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Ctrl {
    /// Initialise the controller in manual mode with no operator intent.
    pub fn new(params: Params) -> Self {
        Self {
            inner: Mutex::new(CtrlInner::new(params, util::time::monotonic_s())),
        }
    }

    /// Run one controller tick, producing the commands to send this cycle.
    ///
    /// The ultrasonic gate is applied to the drive command of every state,
    /// manual included, as the final step.
    pub fn tick(
        &self,
        obs: &VisionObs,
        telemetry: Option<&Telemetry>,
    ) -> (DriveCommand, MechanismCommand) {
        self.lock().tick_at(util::time::monotonic_s(), obs, telemetry)
    }

    /// Switch mode by name. Accepts "manual" or "auto" (case insensitive).
    pub fn set_mode(&self, mode: &str) -> Result<(), CtrlError> {
        match mode.trim().to_lowercase().as_str() {
            "manual" => {
                self.set_manual();
                Ok(())
            }
            "auto" => {
                self.set_auto();
                Ok(())
            }
            other => Err(CtrlError::InvalidMode(other.into())),
        }
    }

    /// Switch to manual, dropping all intent so the robot stops until the
    /// operator commands otherwise.
    pub fn set_manual(&self) {
        info!("Controller entering MANUAL");
        self.lock().set_manual_at(util::time::monotonic_s());
    }

    /// Switch to auto, starting in the searching state.
    pub fn set_auto(&self) {
        info!("Controller entering AUTO_SEARCHING");
        self.lock().set_auto_at(util::time::monotonic_s());
    }

    /// Force a specific state. This is the only entry into `AutoDeposit`,
    /// which no automatic transition reaches.
    pub fn set_state(&self, state: CtrlState) {
        info!("Controller state forced to {:?}", state);
        self.lock().state = state;
    }

    pub fn state(&self) -> CtrlState {
        self.lock().state
    }

    /// Update operator teleop intent. Ignored outside manual mode.
    ///
    /// The mechanism update, if given, is merged into the latched mechanism
    /// intent field by field.
    pub fn update_user_cmd(&self, linear: f64, angular: f64, mech: Option<&MechUpdate>) {
        self.lock()
            .update_user_cmd_at(util::time::monotonic_s(), linear, angular, mech);
    }

    pub fn status(&self) -> CtrlStatusReport {
        self.lock().status()
    }

    /// The commands produced by the most recent tick.
    pub fn last_cmd(&self) -> (DriveCommand, MechanismCommand) {
        let inner = self.lock();
        (inner.last_drive_cmd, inner.last_mech_cmd)
    }

    /// Acquire the inner state, discarding any poison.
    fn lock(&self) -> MutexGuard<CtrlInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CtrlInner {
    pub(crate) fn new(params: Params, now_s: f64) -> Self {
        Self {
            params,
            state: CtrlState::Manual,
            user_cmd: DRIVE_STOP,
            user_cmd_ts_s: now_s,
            user_mech: MECH_NOOP,
            user_mech_ts_s: now_s,
            last_target_seen_ts_s: None,
            last_err_x: 0.0,
            last_err_y: 0.0,
            last_range_ft: None,
            last_range_valid: false,
            ultra_blocked: false,
            last_ultra_in: None,
            last_ultra_valid: false,
            last_drive_cmd: DRIVE_STOP,
            last_mech_cmd: MECH_NOOP,
        }
    }

    /// One full controller tick at the given monotonic time.
    pub(crate) fn tick_at(
        &mut self,
        now_s: f64,
        obs: &VisionObs,
        telemetry: Option<&Telemetry>,
    ) -> (DriveCommand, MechanismCommand) {
        let (drive, mech) = match self.state {
            CtrlState::Manual => self.tick_manual(now_s),
            CtrlState::AutoSearching => self.tick_auto_searching(obs),
            CtrlState::AutoApproaching => self.tick_auto_approaching(now_s, obs),
            CtrlState::AutoPickup => self.tick_auto_pickup(),
            CtrlState::AutoDeposit => self.tick_auto_deposit(),
        };

        // Safety gate last, so no state can bypass it
        let drive = self.apply_ultrasonic_gate(drive, telemetry);

        self.last_drive_cmd = drive;
        self.last_mech_cmd = mech;

        (drive, mech)
    }

    pub(crate) fn set_manual_at(&mut self, now_s: f64) {
        self.state = CtrlState::Manual;

        self.user_cmd = DRIVE_STOP;
        self.user_cmd_ts_s = now_s;
        self.user_mech = MECH_NOOP;
        self.user_mech_ts_s = now_s;

        self.ultra_blocked = false;
    }

    pub(crate) fn set_auto_at(&mut self, now_s: f64) {
        self.state = CtrlState::AutoSearching;

        self.user_mech = MECH_NOOP;
        self.user_mech_ts_s = now_s;

        self.ultra_blocked = false;
    }

    pub(crate) fn update_user_cmd_at(
        &mut self,
        now_s: f64,
        linear: f64,
        angular: f64,
        mech: Option<&MechUpdate>,
    ) {
        if self.state != CtrlState::Manual {
            return;
        }

        self.user_cmd = DriveCommand { linear, angular };
        self.user_cmd_ts_s = now_s;

        if let Some(mech) = mech {
            mech.apply_to(&mut self.user_mech);
            self.user_mech_ts_s = now_s;
        }
    }

    pub(crate) fn status(&self) -> CtrlStatusReport {
        CtrlStatusReport {
            state: self.state,
            deadman_s: self.params.deadman_s,
            target_hold_s: self.params.target_hold_s,
            ultrasonic: UltrasonicGateReport {
                enabled: self.params.ultrasonic_enabled,
                blocked: self.ultra_blocked,
                distance_in: self.last_ultra_in,
                valid: self.last_ultra_valid,
                stop_in: self.params.ultrasonic_stop_in,
                release_in: self.params.ultrasonic_release_in,
                stale_s: self.params.ultrasonic_stale_s,
            },
        }
    }

    /// Manual mode: operator drive intent with deadman, latched mechanism
    /// intent passed through unconditionally.
    fn tick_manual(&mut self, now_s: f64) -> (DriveCommand, MechanismCommand) {
        let cmd_age_s = now_s - self.user_cmd_ts_s;

        // Deadman applies to drive only
        let drive = if cmd_age_s > self.params.deadman_s {
            DRIVE_STOP
        } else {
            self.user_cmd
        };

        (drive, self.user_mech)
    }

    /// Record a state transition made by the tick logic itself.
    pub(crate) fn transition(&mut self, to: CtrlState) {
        debug!("Controller transition {:?} -> {:?}", self.state, to);
        self.state = to;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
