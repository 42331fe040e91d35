//! # Supervisor module
//!
//! The supervisor runs the robot's fixed-period cycle. Every cycle it polls
//! the link and either follows the operator's commands (teleoperation) or
//! holds the equipment in a safe posture (fail-safe).
//!
//! In teleoperation each assigned link channel drives a servo through the
//! angle mapper, the closed-loop channel (if any) starts motor moves, and the
//! battery voltage is reported to the operator. In fail-safe the drivetrain
//! is stopped, the fail-safe servo returns to its neutral angle, and any
//! motor move is aborted.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

pub use params::*;
pub use state::*;
use crate::pos_ctrl::{MoveOutcome, PosCtrlError};
use crate::tm_reporter::TmReporterError;
use util::archive::ArchiveError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A summary of one supervisor cycle.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct CycleReport {
    /// Index of the cycle, starting from zero
    pub cycle: u64,

    /// Time at the start of the cycle.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// True if the cycle ran in teleoperation mode
    pub teleop: bool,

    /// Number of servos sent a command
    pub servos_commanded: u8,

    /// Battery voltage reported to the operator, if any.
    ///
    /// Units: volts
    pub battery_v: Option<f64>,

    /// True if a motor move is still in progress at the end of the cycle
    pub move_active: bool,

    /// Outcome of a motor move which finished during the cycle
    pub move_outcome: Option<MoveOutcome>,

    /// Amount the cycle overran its period by, if it did.
    ///
    /// Units: seconds
    pub overrun_s: Option<f64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while creating the supervisor.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("Invalid supervisor parameters: {0}")]
    ParamsInvalid(#[from] ParamsError),

    #[error("Failed to initialise PosCtrl: {0}")]
    PosCtrlInitError(#[from] PosCtrlError),

    #[error("Failed to initialise the telemetry reporter: {0}")]
    TmReporterInitError(#[from] TmReporterError),

    #[error("Failed to create the cycle report archive: {0}")]
    ArchiveError(#[from] ArchiveError)
}
