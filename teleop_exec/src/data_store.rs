//! # Data Store

use log::{info, warn};
use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Operating mode of the robot.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub enum Mode {
    /// Equipment follows the operator's commands.
    Teleoperating,

    /// Equipment is held in a safe posture.
    FailSafe
}

/// Gives the reason the robot is in its fail-safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub enum FailSafeCause {
    /// No operator has connected since startup
    AwaitingLink,

    /// The operator's link was lost
    LinkLost,

    /// The executable is stopping
    Shutdown
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the supervisor.
#[derive(Debug, Clone)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    // Mode
    mode: Mode,

    /// Gives the reason for the robot being in fail-safe mode.
    fail_safe_cause: Option<FailSafeCause>,

    // Closed-loop motor
    /// Motor position at the first cycle, the reference for measured angles.
    ///
    /// Units: revolutions
    pub motor_zero_rev: Option<f64>,

    /// The last motor command a move was started for since entering
    /// teleoperation.
    ///
    /// Units: degrees
    pub last_motor_cmd_deg: Option<f64>,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for DataStore {
    fn default() -> Self {
        Self {
            num_cycles: 0,
            mode: Mode::FailSafe,
            fail_safe_cause: Some(FailSafeCause::AwaitingLink),
            motor_zero_rev: None,
            last_motor_cmd_deg: None,
            num_consec_cycle_overruns: 0
        }
    }
}

impl DataStore {
    /// Puts the robot into fail-safe mode with the given cause.
    ///
    /// Returns `true` if this changed the mode.
    pub fn make_safe(&mut self, cause: FailSafeCause) -> bool {
        if self.mode == Mode::FailSafe {
            return false
        }

        warn!("Entering fail-safe mode, cause: {:?}", cause);
        self.mode = Mode::FailSafe;
        self.fail_safe_cause = Some(cause);

        true
    }

    /// Leaves fail-safe mode for teleoperation.
    ///
    /// Returns `true` if this changed the mode.
    pub fn make_unsafe(&mut self) -> bool {
        if self.mode == Mode::Teleoperating {
            return false
        }

        info!(
            "Operator connected, leaving fail-safe mode (cause was {:?})", 
            self.fail_safe_cause
        );
        self.mode = Mode::Teleoperating;
        self.fail_safe_cause = None;

        // Commands from a previous connection don't carry over
        self.last_motor_cmd_deg = None;

        true
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn fail_safe_cause(&self) -> Option<FailSafeCause> {
        self.fail_safe_cause
    }

    pub fn is_teleoperating(&self) -> bool {
        self.mode == Mode::Teleoperating
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mode_transitions() {
        let mut ds = DataStore::default();
        assert_eq!(ds.mode(), Mode::FailSafe);
        assert_eq!(ds.fail_safe_cause(), Some(FailSafeCause::AwaitingLink));

        // Already safe, cause is kept
        assert!(!ds.make_safe(FailSafeCause::LinkLost));
        assert_eq!(ds.fail_safe_cause(), Some(FailSafeCause::AwaitingLink));

        ds.last_motor_cmd_deg = Some(10.0);
        assert!(ds.make_unsafe());
        assert!(ds.is_teleoperating());
        assert!(ds.fail_safe_cause().is_none());
        assert!(ds.last_motor_cmd_deg.is_none());
        assert!(!ds.make_unsafe());

        assert!(ds.make_safe(FailSafeCause::LinkLost));
        assert_eq!(ds.fail_safe_cause(), Some(FailSafeCause::LinkLost));
    }
}
