//! Parameters structure for PosCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for position control.
///
/// Every field has a default, so a partial (or empty) parameter file is
/// valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- GAINS ----

    /// Proportional gain.
    ///
    /// Units: effort/revolution
    pub kp: f64,

    /// Integral gain.
    ///
    /// Units: effort/(revolution.second)
    pub ki: f64,

    /// Derivative gain.
    ///
    /// Units: effort.second/revolution
    pub kd: f64,

    // ---- LIMITS ----

    /// Limit on the magnitude of the integral accumulator.
    ///
    /// Units: revolution.seconds
    pub max_integral: f64,

    /// Limit on the magnitude of the effort demanded from the motor. Never
    /// above 1.0.
    pub max_effort: f64,

    // ---- TIMING ----

    /// Period between two control samples.
    ///
    /// Units: seconds
    pub sample_period_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a set of PosCtrl parameters can be rejected.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Gain {0} must be finite and not negative, found {1}")]
    InvalidGain(&'static str, f64),

    #[error("The integral limit must be finite and not negative, found {0}")]
    InvalidMaxIntegral(f64),

    #[error("The effort limit must be in (0, 1], found {0}")]
    InvalidMaxEffort(f64),

    #[error("The sample period must be finite and positive, found {0} s")]
    InvalidSamplePeriod(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            kp: 4.0,
            ki: 0.1,
            kd: 0.2,
            max_integral: 1.0,
            max_effort: 1.0,
            sample_period_s: 0.01,
        }
    }
}

impl Params {
    /// Check that the parameters describe a usable controller.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        for (name, gain) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)].iter() {
            if !gain.is_finite() || *gain < 0.0 {
                return Err(ParamsError::InvalidGain(*name, *gain))
            }
        }

        if !self.max_integral.is_finite() || self.max_integral < 0.0 {
            return Err(ParamsError::InvalidMaxIntegral(self.max_integral))
        }

        if !(self.max_effort > 0.0 && self.max_effort <= 1.0) {
            return Err(ParamsError::InvalidMaxEffort(self.max_effort))
        }

        if !self.sample_period_s.is_finite() || self.sample_period_s <= 0.0 {
            return Err(ParamsError::InvalidSamplePeriod(self.sample_period_s))
        }

        Ok(())
    }

    /// The sample period as a duration.
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(self.sample_period_s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_defaults() {
        // Empty file gives the default gains
        let p: Params = util::params::parse("").unwrap();
        assert_eq!(p.kp, 4.0);
        assert_eq!(p.ki, 0.1);
        assert_eq!(p.kd, 0.2);
        assert_eq!(p.max_integral, 1.0);
        assert_eq!(p.sample_period(), Duration::from_millis(10));
        assert!(p.are_valid().is_ok());

        // Overrides only touch what they name
        let p: Params = util::params::parse("kp = 2.5\nmax_integral = 0.5").unwrap();
        assert_eq!(p.kp, 2.5);
        assert_eq!(p.max_integral, 0.5);
        assert_eq!(p.kd, 0.2);
    }

    #[test]
    fn test_params_invalid() {
        let p = Params { ki: -0.1, ..Default::default() };
        assert!(matches!(p.are_valid(), Err(ParamsError::InvalidGain("ki", _))));

        let p = Params { max_effort: 1.5, ..Default::default() };
        assert!(matches!(p.are_valid(), Err(ParamsError::InvalidMaxEffort(_))));

        let p = Params { sample_period_s: 0.0, ..Default::default() };
        assert!(matches!(p.are_valid(), Err(ParamsError::InvalidSamplePeriod(_))));
    }
}
