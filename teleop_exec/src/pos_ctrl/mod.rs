//! # Position control module
//!
//! Closed-loop control of the encoder-equipped motor. A move is a relative
//! rotation of the motor shaft, executed by a PID controller sampled at a
//! fixed period until the shaft is within tolerance of the target or the
//! move times out.
//!
//! Moves can be executed in two ways:
//! - [`move_by`] runs the whole move before returning, sleeping on the clock
//!   between samples.
//! - [`PosCtrl`] executes one sample per call to `proc`, leaving the caller
//!   to schedule the samples alongside other work.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod pid;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};

// Internal
pub use params::*;
pub use pid::*;
pub use state::*;
use comms_if::eqpt::Motor;
use util::{module::State, time::Clock};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default limit on the motor effort during a move.
pub const DEFAULT_MAX_SPEED: f64 = 1.0;

/// Default tolerance on the final position of a move.
///
/// Units: degrees
pub const DEFAULT_TOLERANCE_DEG: f64 = 1.0;

/// Default time limit for a move.
///
/// Units: seconds
pub const DEFAULT_TIMEOUT_S: f64 = 5.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A request to rotate the motor by a relative angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorMoveRequest {
    /// Signed rotation relative to the current position.
    ///
    /// Units: degrees
    pub angle_deg: f64,

    /// Limit on the magnitude of the motor effort. Values above the
    /// controller's own effort limit have no further effect.
    pub max_speed: f64,

    /// The move succeeds once the shaft is closer than this to the target.
    ///
    /// Units: degrees
    pub tolerance_deg: f64,

    /// The move fails once it has taken longer than this.
    ///
    /// Units: seconds
    pub timeout_s: f64
}

/// A sample of the motor's position.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotorSample {
    /// Time the sample was taken.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Position of the motor shaft.
    ///
    /// Units: revolutions
    pub position_rev: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How a move finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// The shaft reached the target within tolerance and the brake is on.
    Success,

    /// The move ran out of time, the motor has been released.
    TimedOut,

    /// The move was abandoned before finishing.
    Aborted
}

/// Demand on the motor produced by one control sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorDem {
    /// Apply the given effort.
    Effort(f64),

    /// Stop and engage the brake.
    Hold,

    /// Stop without braking.
    Release
}

/// Possible errors that can occur during PosCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum PosCtrlError {
    #[error("Invalid position control parameters: {0}")]
    ParamsInvalid(#[from] ParamsError),

    #[error("Invalid move request: {0}")]
    InvalidRequest(String),

    #[error("A move is already in progress")]
    MoveInProgress,

    #[error("Expected there to be an active move but couldn't find one")]
    NoActiveMove
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Rotate the motor by the requested angle, returning once the move has
/// finished.
///
/// The controller is sampled once per `params.sample_period_s`, sleeping on
/// `clock` in between. On success the motor brake is engaged, on timeout the
/// motor is left with zero effort.
pub fn move_by<M, C>(
    motor: &mut M, 
    clock: &mut C, 
    params: &Params, 
    request: MotorMoveRequest
) -> Result<MoveOutcome, PosCtrlError> 
where
    M: Motor + ?Sized,
    C: Clock + ?Sized
{
    let mut pos_ctrl = PosCtrl::default();
    pos_ctrl.init(params.clone(), None)?;
    pos_ctrl.start(request, motor.get_position(), clock.now_s())?;

    let sample_period = params.sample_period();

    loop {
        let sample = MotorSample {
            time_s: clock.now_s(),
            position_rev: motor.get_position()
        };

        let (dem, report) = pos_ctrl.proc(&sample)?;
        apply_dem(motor, dem);

        if let Some(outcome) = report.outcome {
            return Ok(outcome)
        }

        clock.sleep(sample_period);
    }
}

/// Send a demand to the motor.
pub fn apply_dem<M: Motor + ?Sized>(motor: &mut M, dem: MotorDem) {
    match dem {
        MotorDem::Effort(e) => motor.set_effort(e),
        MotorDem::Hold => {
            motor.set_effort(0.0);
            motor.brake();
        },
        MotorDem::Release => motor.set_effort(0.0)
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotorMoveRequest {
    /// A move of the given angle with the default speed, tolerance and
    /// timeout.
    pub fn new(angle_deg: f64) -> Self {
        Self {
            angle_deg,
            max_speed: DEFAULT_MAX_SPEED,
            tolerance_deg: DEFAULT_TOLERANCE_DEG,
            timeout_s: DEFAULT_TIMEOUT_S
        }
    }

    /// Check that the request can be executed.
    pub fn validate(&self) -> Result<(), PosCtrlError> {
        if !self.angle_deg.is_finite() {
            return Err(PosCtrlError::InvalidRequest(
                format!("angle must be finite, found {}", self.angle_deg)
            ))
        }

        if !self.max_speed.is_finite() || self.max_speed <= 0.0 {
            return Err(PosCtrlError::InvalidRequest(
                format!("max speed must be finite and positive, found {}", self.max_speed)
            ))
        }

        if !self.tolerance_deg.is_finite() || self.tolerance_deg < 0.0 {
            return Err(PosCtrlError::InvalidRequest(format!(
                "tolerance must be finite and not negative, found {} deg", 
                self.tolerance_deg
            )))
        }

        if !self.timeout_s.is_finite() || self.timeout_s < 0.0 {
            return Err(PosCtrlError::InvalidRequest(format!(
                "timeout must be finite and not negative, found {} s", 
                self.timeout_s
            )))
        }

        debug!("Move request {:?} is valid", self);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimMotor;
    use util::time::SimClock;

    #[test]
    fn test_move_converges() {
        let mut motor = SimMotor::new(0.01);
        let mut clock = SimClock::new();

        let outcome = move_by(
            &mut motor, 
            &mut clock, 
            &Params::default(), 
            MotorMoveRequest::new(90.0)
        ).unwrap();

        assert_eq!(outcome, MoveOutcome::Success);
        assert!((motor.position_rev - 0.25).abs() * 360.0 < 1.0);
        assert!(motor.num_brakes >= 1);
        assert_eq!(motor.effort, 0.0);
        assert!(clock.now_s() < DEFAULT_TIMEOUT_S);
    }

    #[test]
    fn test_move_backwards() {
        let mut motor = SimMotor::new(0.01);
        motor.position_rev = 2.0;
        let mut clock = SimClock::new();

        let outcome = move_by(
            &mut motor, 
            &mut clock, 
            &Params::default(), 
            MotorMoveRequest::new(-45.0)
        ).unwrap();

        assert_eq!(outcome, MoveOutcome::Success);
        assert!((motor.position_rev - 1.875).abs() * 360.0 < 1.0);
    }

    #[test]
    fn test_stuck_motor_times_out() {
        let mut motor = SimMotor::new(0.01);
        motor.stuck = true;
        let mut clock = SimClock::new();
        let params = Params::default();

        let outcome = move_by(
            &mut motor, 
            &mut clock, 
            &params, 
            MotorMoveRequest::new(90.0)
        ).unwrap();

        assert_eq!(outcome, MoveOutcome::TimedOut);
        assert_eq!(motor.effort, 0.0);
        assert_eq!(motor.num_brakes, 0);

        // Gave up at the first sample after the timeout
        let t = clock.now_s();
        assert!(t > DEFAULT_TIMEOUT_S);
        assert!(t <= DEFAULT_TIMEOUT_S + 2.0 * params.sample_period_s);
    }

    #[test]
    fn test_move_within_tolerance_is_immediate() {
        let mut motor = SimMotor::new(0.01);
        let mut clock = SimClock::new();

        let outcome = move_by(
            &mut motor, 
            &mut clock, 
            &Params::default(), 
            MotorMoveRequest::new(0.5)
        ).unwrap();

        assert_eq!(outcome, MoveOutcome::Success);
        assert_eq!(clock.now_s(), 0.0);
        assert_eq!(motor.position_rev, 0.0);
    }

    #[test]
    fn test_invalid_requests() {
        let mut motor = SimMotor::new(0.01);
        let mut clock = SimClock::new();
        let params = Params::default();

        let bad = [
            MotorMoveRequest { max_speed: 0.0, ..MotorMoveRequest::new(10.0) },
            MotorMoveRequest { tolerance_deg: -1.0, ..MotorMoveRequest::new(10.0) },
            MotorMoveRequest { timeout_s: f64::NAN, ..MotorMoveRequest::new(10.0) },
            MotorMoveRequest::new(f64::INFINITY),
        ];

        for request in bad.iter() {
            assert!(matches!(
                move_by(&mut motor, &mut clock, &params, *request),
                Err(PosCtrlError::InvalidRequest(_))
            ));
        }

        // Nothing was sent to the motor
        assert!(motor.effort_history.is_empty());
    }

    #[test]
    fn test_apply_dem() {
        let mut motor = SimMotor::new(0.0);

        apply_dem(&mut motor, MotorDem::Effort(0.4));
        assert_eq!(motor.effort, 0.4);

        apply_dem(&mut motor, MotorDem::Hold);
        assert_eq!(motor.effort, 0.0);
        assert_eq!(motor.num_brakes, 1);

        apply_dem(&mut motor, MotorDem::Release);
        assert_eq!(motor.num_brakes, 1);
        assert_eq!(motor.effort_history, vec![0.4, 0.0, 0.0]);
    }
}
