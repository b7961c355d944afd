//! Linear ramps shared by the frequency sweep and the amplitude envelope.
//!
//! Both helpers work on integer endpoints with an `f32` interpolation factor
//! and truncate the result toward zero, so every engine produces the same
//! integer levels for the same sample time.

/// Interpolate between `a` and `b` by `t`, truncating toward zero.
///
/// `t` is expected in `[0.0, 1.0]` but is not clamped.
#[inline]
pub fn lerp(a: i32, b: i32, t: f32) -> i32 {
    (a as f32 + t * (b - a) as f32) as i32
}

/// Interpolate from `a` at `t1` to `b` at `t2`, evaluated at `time`.
///
/// A zero-width interval (`t1 == t2`) yields `b`: the ramp has already
/// completed. Callers keep `t1 <= time`, so the subtraction never wraps.
#[inline]
pub fn ramp(a: i32, b: i32, time: u64, t1: u64, t2: u64) -> i32 {
    if t1 == t2 {
        return b;
    }
    let t = (time - t1) as f32 / (t2 - t1) as f32;
    lerp(a, b, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(0, 100, 0.0), 0);
        assert_eq!(lerp(0, 100, 1.0), 100);
        assert_eq!(lerp(100, 0, 1.0), 0);
        assert_eq!(lerp(-50, 50, 0.5), 0);
    }

    #[test]
    fn test_lerp_truncates_toward_zero() {
        assert_eq!(lerp(0, 10, 0.19), 1);
        assert_eq!(lerp(0, -10, 0.19), -1);
        assert_eq!(lerp(10, 0, 0.05), 9);
    }

    #[test]
    fn test_ramp_progression() {
        assert_eq!(ramp(0, 1000, 100, 100, 200), 0);
        assert_eq!(ramp(0, 1000, 150, 100, 200), 500);
        assert_eq!(ramp(0, 1000, 199, 100, 200), 990);
        assert_eq!(ramp(1000, 0, 150, 100, 200), 500);
    }

    #[test]
    fn test_ramp_degenerate_interval_returns_end() {
        assert_eq!(ramp(0, 4915, 42, 42, 42), 4915);
        assert_eq!(ramp(4915, 0, 7, 7, 7), 0);
    }

    #[test]
    fn test_ramp_frequency_sweep() {
        // 440 Hz to 880 Hz over 44100 samples
        assert_eq!(ramp(440, 880, 0, 0, 44_100), 440);
        assert_eq!(ramp(440, 880, 22_050, 0, 44_100), 660);
    }
}
