//! Parameters structure for the supervisor

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use comms_if::eqpt::ServoId;
use crate::angle_map::SERVO_MAX_ANGLE_DEG;
use crate::pos_ctrl::{DEFAULT_MAX_SPEED, DEFAULT_TIMEOUT_S, DEFAULT_TOLERANCE_DEG};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the supervisor, loaded from `teleop_exec.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Link channels driving each servo.
    pub servo_channels: Vec<ServoChannel>,

    /// Posture held in fail-safe mode.
    pub failsafe: FailSafeParams,

    /// The closed-loop motor channel, if one is used.
    pub motor: Option<MotorChannelParams>,

    /// How closed-loop moves are executed.
    pub move_exec: MoveExec,

    /// If true a cycle report is archived every cycle.
    pub archive: bool
}

/// Assignment of one link channel to one servo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoChannel {
    pub channel: usize,
    pub servo: ServoId
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FailSafeParams {
    /// The servo returned to neutral in fail-safe mode
    pub servo: ServoId,

    /// Neutral angle of the fail-safe servo.
    ///
    /// Units: degrees
    pub angle_deg: f64
}

/// The link channel commanding the closed-loop motor, and how moves to follow
/// it are made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorChannelParams {
    pub channel: usize,

    /// Units: degrees
    pub tolerance_deg: f64,

    pub max_speed: f64,

    /// Units: seconds
    pub timeout_s: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Ways of executing a closed-loop move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveExec {
    /// Move one sample at a time in the idle part of each cycle.
    Stepped,

    /// Finish the whole move within the cycle which starts it.
    Blocking
}

/// Reasons a set of supervisor parameters can be rejected.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("The cycle period must be finite and positive, found {0} s")]
    InvalidCyclePeriod(f64),

    #[error("Servo {0:?} is assigned to more than one channel")]
    ServoAssignedTwice(ServoId),

    #[error("Channel {0} is assigned more than once")]
    ChannelAssignedTwice(usize),

    #[error("The fail-safe angle must be in [0, 180], found {0} deg")]
    InvalidFailSafeAngle(f64),

    #[error("Invalid closed-loop motor channel parameters: {0}")]
    InvalidMotorChannel(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.1,
            servo_channels: vec![
                ServoChannel { channel: 0, servo: ServoId::One },
                ServoChannel { channel: 1, servo: ServoId::Two },
                ServoChannel { channel: 2, servo: ServoId::Three },
                ServoChannel { channel: 4, servo: ServoId::Four },
            ],
            failsafe: FailSafeParams::default(),
            motor: None,
            move_exec: MoveExec::Stepped,
            archive: true
        }
    }
}

impl Default for FailSafeParams {
    fn default() -> Self {
        Self {
            servo: ServoId::One,
            angle_deg: 70.0
        }
    }
}

impl Default for MotorChannelParams {
    fn default() -> Self {
        Self {
            channel: 5,
            tolerance_deg: DEFAULT_TOLERANCE_DEG,
            max_speed: DEFAULT_MAX_SPEED,
            timeout_s: DEFAULT_TIMEOUT_S
        }
    }
}

impl Default for MoveExec {
    fn default() -> Self {
        MoveExec::Stepped
    }
}

impl Params {
    /// Check that the parameters describe a usable supervisor.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !self.cycle_period_s.is_finite() || self.cycle_period_s <= 0.0 {
            return Err(ParamsError::InvalidCyclePeriod(self.cycle_period_s))
        }

        let mut servos = HashSet::new();
        let mut channels = HashSet::new();

        for sc in self.servo_channels.iter() {
            if !servos.insert(sc.servo) {
                return Err(ParamsError::ServoAssignedTwice(sc.servo))
            }
            if !channels.insert(sc.channel) {
                return Err(ParamsError::ChannelAssignedTwice(sc.channel))
            }
        }

        if !(0.0..=SERVO_MAX_ANGLE_DEG).contains(&self.failsafe.angle_deg) {
            return Err(ParamsError::InvalidFailSafeAngle(self.failsafe.angle_deg))
        }

        if let Some(ref m) = self.motor {
            if !channels.insert(m.channel) {
                return Err(ParamsError::ChannelAssignedTwice(m.channel))
            }

            if !m.tolerance_deg.is_finite() || m.tolerance_deg <= 0.0 {
                return Err(ParamsError::InvalidMotorChannel(format!(
                    "tolerance must be finite and positive, found {} deg",
                    m.tolerance_deg
                )))
            }
            if !m.max_speed.is_finite() || m.max_speed <= 0.0 {
                return Err(ParamsError::InvalidMotorChannel(format!(
                    "max speed must be finite and positive, found {}",
                    m.max_speed
                )))
            }
            if !m.timeout_s.is_finite() || m.timeout_s < 0.0 {
                return Err(ParamsError::InvalidMotorChannel(format!(
                    "timeout must be finite and not negative, found {} s",
                    m.timeout_s
                )))
            }
        }

        Ok(())
    }

    /// The cycle period as a duration.
    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs_f64(self.cycle_period_s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let p: Params = util::params::parse("").unwrap();
        assert_eq!(p.cycle_period(), Duration::from_millis(100));
        assert_eq!(p.servo_channels.len(), 4);
        assert_eq!(p.servo_channels[3], ServoChannel { channel: 4, servo: ServoId::Four });
        assert_eq!(p.failsafe.servo, ServoId::One);
        assert_eq!(p.failsafe.angle_deg, 70.0);
        assert!(p.motor.is_none());
        assert_eq!(p.move_exec, MoveExec::Stepped);
        assert!(p.archive);
        assert!(p.are_valid().is_ok());
    }

    #[test]
    fn test_params_from_toml() {
        let p: Params = util::params::parse(r#"
            move_exec = "Blocking"
            archive = false

            [[servo_channels]]
            channel = 3
            servo = "Two"

            [failsafe]
            angle_deg = 90.0

            [motor]
            channel = 6
            timeout_s = 2.0
        "#).unwrap();

        assert_eq!(p.move_exec, MoveExec::Blocking);
        assert!(!p.archive);
        assert_eq!(p.servo_channels, vec![ServoChannel { channel: 3, servo: ServoId::Two }]);
        assert_eq!(p.failsafe.servo, ServoId::One);
        assert_eq!(p.failsafe.angle_deg, 90.0);

        let m = p.motor.unwrap();
        assert_eq!(m.channel, 6);
        assert_eq!(m.timeout_s, 2.0);
        assert_eq!(m.tolerance_deg, DEFAULT_TOLERANCE_DEG);
        assert!(p.are_valid().is_ok());
    }

    #[test]
    fn test_params_invalid() {
        let mut p = Params::default();
        p.servo_channels.push(ServoChannel { channel: 7, servo: ServoId::Two });
        assert!(matches!(p.are_valid(), Err(ParamsError::ServoAssignedTwice(ServoId::Two))));

        let p = Params {
            motor: Some(MotorChannelParams { channel: 4, ..Default::default() }),
            ..Default::default()
        };
        assert!(matches!(p.are_valid(), Err(ParamsError::ChannelAssignedTwice(4))));

        let p = Params {
            failsafe: FailSafeParams { angle_deg: 200.0, ..Default::default() },
            ..Default::default()
        };
        assert!(matches!(p.are_valid(), Err(ParamsError::InvalidFailSafeAngle(_))));
    }
}
