//! # Drive and mechanism commands
//!
//! These are the host-side command structures which the controller produces
//! each cycle and the serial link encodes into command frames.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// A drive command bringing the robot to a full stop.
pub const DRIVE_STOP: DriveCommand = DriveCommand {
    linear: 0.0,
    angular: 0.0,
};

/// A mechanism command which leaves every channel untouched.
pub const MECH_NOOP: MechanismCommand = MechanismCommand {
    motor_rhs: None,
    motor_lhs: None,
    servo_lid_deg: None,
    servo_sweep_deg: None,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demanded body velocity of the robot.
///
/// Produced fresh by the controller each tick, never latched inside the link.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct DriveCommand {
    /// Forward velocity demand. Positive values are "forwards".
    pub linear: f64,

    /// Turn rate demand. Positive values turn to the left.
    pub angular: f64,
}

/// A directive for a single mechanism motor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MechMotorCommand {
    /// How `value` is to be interpreted by the firmware.
    pub mode: MechMotorMode,

    /// Position in degrees for `PosDeg`, or a duty cycle in [-1, 1] for
    /// `Duty`.
    pub value: f64,
}

/// Demands for all mechanism channels.
///
/// A channel set to `None` means "no demand" - the firmware treats it as a
/// no-op for that channel.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct MechanismCommand {
    #[serde(rename = "motor_RHS")]
    pub motor_rhs: Option<MechMotorCommand>,

    #[serde(rename = "motor_LHS")]
    pub motor_lhs: Option<MechMotorCommand>,

    /// Lid servo angle demand.
    ///
    /// Units: degrees
    #[serde(rename = "servo_LID_deg")]
    pub servo_lid_deg: Option<f64>,

    /// Sweeper servo angle demand.
    ///
    /// Units: degrees
    #[serde(rename = "servo_SWEEP_deg")]
    pub servo_sweep_deg: Option<f64>,
}

/// A partial update to a latched [`MechanismCommand`].
///
/// Each field is three-way: leave the latched value unchanged, clear the
/// channel back to no-op, or set a new value. This distinguishes "the caller
/// said nothing about this channel" from "the caller asked for neutral".
#[derive(Debug, Clone, Copy, Default)]
pub struct MechUpdate {
    pub motor_rhs: FieldUpdate<MechMotorCommand>,
    pub motor_lhs: FieldUpdate<MechMotorCommand>,
    pub servo_lid_deg: FieldUpdate<f64>,
    pub servo_sweep_deg: FieldUpdate<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Interpretation of a mechanism motor demand value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MechMotorMode {
    /// Absolute position demand in degrees.
    #[serde(rename = "POS_DEG")]
    PosDeg,

    /// Open-loop duty cycle demand in [-1, 1].
    #[serde(rename = "DUTY")]
    Duty,
}

/// A three-way update to a single latched command field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldUpdate<T> {
    /// Leave the latched value unchanged.
    Unchanged,

    /// Clear the channel back to no-op.
    Clear,

    /// Set a new value.
    Set(T),
}

/// Errors raised when parsing command tokens supplied by a caller.
#[derive(Debug, Error)]
pub enum CmdParseError {
    #[error("Unknown mechanism motor mode \"{0}\", expected \"POS_DEG\" or \"DUTY\"")]
    InvalidMotorMode(String)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MechUpdate {
    /// Merge this update into a latched mechanism command, field by field.
    pub fn apply_to(&self, cmd: &mut MechanismCommand) {
        self.motor_rhs.apply_to(&mut cmd.motor_rhs);
        self.motor_lhs.apply_to(&mut cmd.motor_lhs);
        self.servo_lid_deg.apply_to(&mut cmd.servo_lid_deg);
        self.servo_sweep_deg.apply_to(&mut cmd.servo_sweep_deg);
    }
}

impl<T: Copy> FieldUpdate<T> {
    /// Apply this update to a latched optional field.
    pub fn apply_to(&self, field: &mut Option<T>) {
        match self {
            FieldUpdate::Unchanged => (),
            FieldUpdate::Clear => *field = None,
            FieldUpdate::Set(v) => *field = Some(*v),
        }
    }
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Unchanged
    }
}

impl FromStr for MechMotorMode {
    type Err = CmdParseError;

    /// Parse a wire-format motor mode token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POS_DEG" => Ok(MechMotorMode::PosDeg),
            "DUTY" => Ok(MechMotorMode::Duty),
            _ => Err(CmdParseError::InvalidMotorMode(s.into()))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mech_update_merge() {
        let mut latched = MechanismCommand {
            motor_rhs: None,
            motor_lhs: None,
            servo_lid_deg: Some(90.0),
            servo_sweep_deg: Some(45.0),
        };

        // Omitted fields stay latched, explicit clears go to no-op
        let update = MechUpdate {
            servo_lid_deg: FieldUpdate::Set(120.0),
            servo_sweep_deg: FieldUpdate::Clear,
            ..Default::default()
        };
        update.apply_to(&mut latched);

        assert_eq!(latched.servo_lid_deg, Some(120.0));
        assert_eq!(latched.servo_sweep_deg, None);
        assert_eq!(latched.motor_rhs, None);

        // A fully-unchanged update is a no-op
        MechUpdate::default().apply_to(&mut latched);
        assert_eq!(latched.servo_lid_deg, Some(120.0));

        // Motors can be set too
        let update = MechUpdate {
            motor_rhs: FieldUpdate::Set(MechMotorCommand {
                mode: MechMotorMode::Duty,
                value: 0.2,
            }),
            ..Default::default()
        };
        update.apply_to(&mut latched);
        assert_eq!(
            latched.motor_rhs,
            Some(MechMotorCommand {
                mode: MechMotorMode::Duty,
                value: 0.2
            })
        );
    }

    #[test]
    fn test_motor_mode_tokens() {
        assert_eq!(
            "POS_DEG".parse::<MechMotorMode>().unwrap(),
            MechMotorMode::PosDeg
        );
        assert_eq!("DUTY".parse::<MechMotorMode>().unwrap(), MechMotorMode::Duty);
        assert!("pos_deg".parse::<MechMotorMode>().is_err());
        assert!("".parse::<MechMotorMode>().is_err());
    }
}
