//! # PID controller
//!
//! The controller is time-aware but takes the time of each sample from its
//! caller, so it can be driven by either a wall or simulated clock.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::maths::clamp_abs;

use super::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller with a bounded integral term.
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Time of the previous sample in seconds
    prev_time_s: Option<f64>,

    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Limit on the magnitude of the integral accumulation
    max_integral: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains and integral limit.
    pub fn new(k_p: f64, k_i: f64, k_d: f64, max_integral: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            max_integral: max_integral.abs(),
            integral: 0f64,
            prev_time_s: None,
            prev_error: None
        }
    }

    /// Create a new controller from the position control parameters.
    pub fn from_params(params: &Params) -> Self {
        Self::new(params.kp, params.ki, params.kd, params.max_integral)
    }

    /// Get the value of the controller for the given error, sampled at
    /// `time_s`.
    pub fn get(&mut self, error: f64, time_s: f64) -> f64 {
        // Calculate dt, a sample at or before the previous one has no usable
        // time difference
        let dt = match self.prev_time_s {
            Some(t0) if time_s > t0 => Some(time_s - t0),
            _ => None
        };

        // Accumulate the integral term.
        //
        // If there's no time difference then we don't accumulate the integral,
        // adding the raw error instead would produce a large spike.
        if let Some(t) = dt {
            self.integral = clamp_abs(
                self.integral + error * t, 
                self.max_integral
            );
        }

        // Calculate the derivative, zero without a previous sample.
        let deriv = match (self.prev_error, dt) {
            (Some(e), Some(t)) => (error - e) / t,
            _ => 0f64
        };

        // Calculate the output
        let out = 
            self.k_p * error 
            + self.k_i * self.integral 
            + self.k_d * deriv;

        // Update the previous values
        self.prev_error = Some(error);
        self.prev_time_s = Some(time_s);

        out
    }

    /// Current value of the integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Forget all history, keeping the gains.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
        self.prev_time_s = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_first_sample_is_proportional() {
        let mut pid = PidController::new(2.0, 1.0, 1.0, 10.0);

        // No history so no integral or derivative
        assert_eq!(pid.get(0.5, 3.0), 1.0);
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn test_integral_and_derivative() {
        let mut pid = PidController::new(0.0, 1.0, 0.0, 10.0);
        pid.get(1.0, 0.0);
        let out = pid.get(1.0, 0.5);
        assert!((out - 0.5).abs() < 1e-12);

        let mut pid = PidController::new(0.0, 0.0, 1.0, 10.0);
        pid.get(1.0, 0.0);
        let out = pid.get(0.5, 0.5);
        assert!((out + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_integral_clamp() {
        let mut pid = PidController::new(0.0, 1.0, 0.0, 0.25);

        for i in 0..100 {
            pid.get(1.0, i as f64 * 0.1);
        }
        assert_eq!(pid.integral(), 0.25);

        for i in 100..300 {
            pid.get(-1.0, i as f64 * 0.1);
        }
        assert_eq!(pid.integral(), -0.25);
    }

    #[test]
    fn test_repeated_time_does_not_accumulate() {
        let mut pid = PidController::new(1.0, 1.0, 1.0, 10.0);
        pid.get(1.0, 1.0);
        let out = pid.get(2.0, 1.0);
        assert_eq!(out, 2.0);
        assert_eq!(pid.integral(), 0.0);

        pid.reset();
        assert_eq!(pid.get(1.0, 0.0), 1.0);
    }
}
