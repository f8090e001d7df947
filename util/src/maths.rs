//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Clamp a value between a minimum and maximum.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Wrap an angle into the range (-pi, pi].
///
/// Any number of full turns is removed, so `wrap_to_pi(a + 2*pi*k)` equals
/// `wrap_to_pi(a)` (up to rounding) for any integer `k`.
pub fn wrap_to_pi<T>(value: T) -> T
where
    T: Float + FloatConst
{
    let pi_t = T::PI();
    let tau_t = pi_t + pi_t;

    let r = pi_t - rem_euclid(pi_t - value, tau_t);

    // rem_euclid may round up to exactly tau
    if r <= -pi_t {
        r + tau_t
    }
    else {
        r
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_wrap_to_pi_range() {
        assert_eq!(wrap_to_pi(0f64), 0f64);
        assert_eq!(wrap_to_pi(PI), PI);
        assert_eq!(wrap_to_pi(-PI), PI);
        assert!((wrap_to_pi(1.5 * PI) - (-0.5 * PI)).abs() < 1e-12);
        assert!((wrap_to_pi(-1.5 * PI) - (0.5 * PI)).abs() < 1e-12);

        let mut a = -10.0;
        while a < 10.0 {
            let w = wrap_to_pi(a);
            assert!(w > -PI && w <= PI, "{} wrapped to {}", a, w);
            a += 0.01;
        }
    }

    #[test]
    fn test_wrap_to_pi_idempotent() {
        for a in &[-3.0, -PI + 1e-9, 0.3, 2.9, PI] {
            let w = wrap_to_pi(*a);
            assert!((wrap_to_pi(w) - w).abs() < 1e-12);
        }
    }

    #[test]
    fn test_wrap_to_pi_full_turns() {
        for a in &[-2.5, -0.4, 0.0, 1.0, 3.0] {
            for k in -3..=3 {
                let shifted = *a + TAU * k as f64;
                assert!((wrap_to_pi(shifted) - wrap_to_pi(*a)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-45f64, -40f64, 65f64), -40f64);
        assert_eq!(clamp(70f64, -40f64, 65f64), 65f64);
        assert_eq!(clamp(1f64, -40f64, 65f64), 1f64);
    }
}
