//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Number of degrees in a full revolution
pub const DEG_PER_REV: f64 = 360.0;

/// Clamp a value into the symmetric range `[-limit, limit]`.
///
/// `limit` is expected to be positive, a negative limit is treated as its
/// magnitude.
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float
{
    let limit = limit.abs();

    if value > limit {
        limit
    }
    else if value < -limit {
        -limit
    }
    else {
        value
    }
}

/// Get the signed angular distance from `a` to `b` on a circle with the given
/// period (for example `360.0` for degrees).
///
/// This function will return the shortest signed distance between a and b
/// accounting for wrapping, positive if `b` lies ahead of `a`.
pub fn get_ang_dist<T>(a: T, b: T, period: T) -> T
where
    T: Float
{
    let c = rem_euclid(a - b, period);
    let d = rem_euclid(b - a, period);

    if c < d {
        -c
    }
    else {
        d
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Convert revolutions into degrees.
pub fn rev_to_deg(rev: f64) -> f64 {
    rev * DEG_PER_REV
}

/// Convert degrees into revolutions.
pub fn deg_to_rev(deg: f64) -> f64 {
    deg / DEG_PER_REV
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_ang_dist() {
        const TAU: f64 = std::f64::consts::TAU;

        assert_eq!(get_ang_dist(1f64, 2f64, TAU), 1f64);
        assert_eq!(get_ang_dist(2f64, 1f64, TAU), -1f64);
        assert_eq!(get_ang_dist(0f64, TAU, TAU), 0f64);
        assert_eq!(get_ang_dist(TAU, 0f64, TAU), 0f64);

        assert_eq!(get_ang_dist(10f64, 350f64, DEG_PER_REV), -20f64);
        assert_eq!(get_ang_dist(350f64, 10f64, DEG_PER_REV), 20f64);
        assert_eq!(get_ang_dist(0f64, 90f64, DEG_PER_REV), 90f64);
        assert_eq!(get_ang_dist(0f64, 360f64, DEG_PER_REV), 0f64);
        assert_eq!(get_ang_dist(90f64, 0f64, DEG_PER_REV), -90f64);
    }

    #[test]
    fn test_clamp_abs() {
        assert_eq!(clamp_abs(2.5f64, 1.0), 1.0);
        assert_eq!(clamp_abs(-2.5f64, 1.0), -1.0);
        assert_eq!(clamp_abs(0.3f64, 1.0), 0.3);
        assert_eq!(clamp_abs(-0.3f64, -1.0), -0.3);
    }

    #[test]
    fn test_rev_deg() {
        assert_eq!(rev_to_deg(0.25), 90.0);
        assert_eq!(deg_to_rev(-90.0), -0.25);
        assert_eq!(rem_euclid(-90f64, DEG_PER_REV), 270.0);
    }
}
