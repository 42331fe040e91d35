//! # Angle mapping
//!
//! Operators command angles on a full circle, `[0, 360]` degrees, while the
//! servos only cover `[0, 180]`. Commands in the upper half are folded back
//! onto the lower half so that the servo mirrors the operator's control.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{eqpt::Servo, link::is_valid_cmd};
use log::trace;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Largest angle a servo can be commanded to.
///
/// Units: degrees
pub const SERVO_MAX_ANGLE_DEG: f64 = 180.0;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a commanded angle onto the servo's range.
///
/// Returns `None` if the angle is not a valid command.
pub fn map(angle_deg: f64) -> Option<f64> {
    if !is_valid_cmd(angle_deg) {
        return None
    }

    if angle_deg <= SERVO_MAX_ANGLE_DEG {
        Some(angle_deg)
    }
    else {
        Some(360.0 - angle_deg)
    }
}

/// Map the commanded angle and send it to the servo.
///
/// An invalid command leaves the servo untouched. Returns the angle sent to
/// the servo, if any.
pub fn apply<S: Servo + ?Sized>(servo: &mut S, angle_deg: f64) -> Option<f64> {
    let mapped = map(angle_deg)?;

    trace!("Servo command {:.1} deg -> {:.1} deg", angle_deg, mapped);
    servo.set_angle(mapped);

    Some(mapped)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimServo;

    #[test]
    fn test_map() {
        assert_eq!(map(0.0), Some(0.0));
        assert_eq!(map(90.0), Some(90.0));
        assert_eq!(map(180.0), Some(180.0));
        assert_eq!(map(200.0), Some(160.0));
        assert_eq!(map(270.0), Some(90.0));
        assert_eq!(map(360.0), Some(0.0));

        assert_eq!(map(-1.0), None);
        assert_eq!(map(360.5), None);
        assert_eq!(map(f64::NAN), None);
    }

    #[test]
    fn test_map_range_and_symmetry() {
        for i in 0..=720 {
            let a = i as f64 * 0.5;
            let m = map(a).unwrap();
            assert!((0.0..=180.0).contains(&m));
            assert_eq!(m, map(360.0 - a).unwrap());
        }
    }

    #[test]
    fn test_apply() {
        let mut servo = SimServo::default();

        assert_eq!(apply(&mut servo, 300.0), Some(60.0));
        assert_eq!(apply(&mut servo, -1.0), None);
        assert_eq!(apply(&mut servo, 400.0), None);

        assert_eq!(servo.history, vec![60.0]);
        assert_eq!(servo.angle_deg, Some(60.0));
    }
}
