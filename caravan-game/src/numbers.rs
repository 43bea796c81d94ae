//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn floor_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).floor();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Floor a f32 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f32_to_i64(value: f32) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    cast::<f32, i64>(value.floor()).unwrap_or(if value > 0.0 { i64::MAX } else { i64::MIN })
}

/// Convert a usize index into f32, saturating for absurdly large values.
#[must_use]
pub fn usize_to_f32(value: usize) -> f32 {
    cast::<usize, f32>(value).unwrap_or(f32::MAX)
}

/// Convert an f32 sample count into usize, returning 0 for negative or non-finite input.
#[must_use]
pub fn f32_to_usize(value: f32) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f32, usize>(value.floor()).unwrap_or(0)
}

/// Convert an i32 into f32 while allowing precision loss in a single location.
#[must_use]
pub fn i32_to_f32(value: i32) -> f32 {
    cast::<i32, f32>(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_handles_nan_and_range() {
        assert_eq!(floor_f64_to_i32(45.0 * 1.15), 51);
        assert_eq!(floor_f64_to_i32(f64::NAN), 0);
        assert_eq!(floor_f64_to_i32(f64::from(i32::MAX) * 2.0), i32::MAX);
    }

    #[test]
    fn floor_to_i64_handles_non_finite() {
        assert_eq!(floor_f32_to_i64(12.9), 12);
        assert_eq!(floor_f32_to_i64(f32::INFINITY), 0);
    }

    #[test]
    fn usize_conversions_saturate() {
        assert_eq!(f32_to_usize(-3.0), 0);
        assert_eq!(f32_to_usize(44_100.7), 44_100);
        assert!((usize_to_f32(6) - 6.0).abs() < f32::EPSILON);
    }
}
