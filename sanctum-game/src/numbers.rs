//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a count to `f64`, returning 0.0 if it cannot be represented.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a count to `i32`, saturating at `i32::MAX`.
#[must_use]
pub fn usize_to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Convert a `u32` to `i32`, saturating at `i32::MAX`.
#[must_use]
pub fn u32_to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Floor a f64 and clamp it to the usize range, returning 0 for non-finite
/// or negative values.
#[must_use]
pub fn floor_f64_to_usize(value: f64) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f64, usize>(value.floor()).unwrap_or(usize::MAX)
}

/// Percentage points expressed as a probability.
#[must_use]
pub fn points_to_probability(points: i32) -> f64 {
    f64::from(points) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_convert_and_saturate() {
        assert!((usize_to_f64(5) - 5.0).abs() < f64::EPSILON);
        assert_eq!(usize_to_i32(usize::MAX), i32::MAX);
        assert_eq!(u32_to_i32(u32::MAX), i32::MAX);
        assert_eq!(u32_to_i32(12), 12);
    }

    #[test]
    fn floor_handles_edges() {
        assert_eq!(floor_f64_to_usize(3.9), 3);
        assert_eq!(floor_f64_to_usize(-1.0), 0);
        assert_eq!(floor_f64_to_usize(f64::NAN), 0);
    }

    #[test]
    fn points_scale_to_probability() {
        assert!((points_to_probability(10) - 0.1).abs() < 1e-12);
    }
}
