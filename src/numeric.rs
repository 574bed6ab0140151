use num_traits::{Float, NumCast, ToPrimitive};
use std::fmt::Display;

/// Centimorgans per Morgan.
pub const CM_PER_MORGAN: f64 = 100.0;

/// Assert two float values are the same up to `eps`.
#[allow(dead_code)]
pub fn assert_float_eq<T>(left: T, right: T, eps: T)
where
    T: Float + Display,
{
    if left.is_nan() {
        assert!(right.is_nan(), "left is NaN, but right is not");
    } else {
        let diff = (left - right).abs();
        assert!(
            diff < eps,
            "values |{} - {}| ≥ {} (diff: {})",
            left,
            right,
            eps,
            diff
        );
    }
}

/// Assert two float slices are the same up to `eps`.
#[allow(dead_code)]
pub fn assert_floats_eq<T>(left: &[T], right: &[T], eps: T)
where
    T: Float + Display,
{
    assert_eq!(left.len(), right.len());
    for (l, r) in left.iter().zip(right.iter()) {
        assert_float_eq(*l, *r, eps)
    }
}

/// Linearly interpolate `y` at `x0` on the segment `(x1, y1)`–`(x2, y2)`.
///
/// The endpoints are returned as-is when `x0` lands on them, so values at
/// breakpoints are exact. A zero-width segment (`x1 == x2`) is the caller's
/// problem; genetic maps guarantee strictly increasing positions.
pub fn interp_segment<Tx, Ty>(x1: Tx, x2: Tx, y1: Ty, y2: Ty, x0: Tx) -> Option<Ty>
where
    Tx: PartialEq + ToPrimitive + Copy,
    Ty: Float,
{
    if x0 == x1 {
        return Some(y1);
    }
    if x0 == x2 {
        return Some(y2);
    }
    let x0 = x0.to_f64()?;
    let x1 = x1.to_f64()?;
    let x2 = x2.to_f64()?;
    let fraction: Ty = NumCast::from((x0 - x1) / (x2 - x1))?;
    Some(y1 + fraction * (y2 - y1))
}

/// Format a float with up to six decimals, dropping trailing zeros.
pub fn format_float(x: f64) -> String {
    let formatted = format!("{:.6}", x);
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}

/// Convert a genetic distance in centimorgans to Morgans.
pub fn cm_to_morgans<T: Float>(cm: T) -> T {
    cm / T::from(CM_PER_MORGAN).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interp_segment_midpoint() {
        let y = interp_segment(0u64, 1_000_000, 0.0, 10.0, 500_000).unwrap();
        assert_float_eq(y, 5.0, 1e-12);
    }

    #[test]
    fn test_interp_segment_exact_at_endpoints() {
        // 0.1 + (0.3 - 0.1) is not 0.3 in floating point
        assert_eq!(interp_segment(10u64, 20, 0.1, 0.3, 20), Some(0.3));
        assert_eq!(interp_segment(10u64, 20, 0.1, 0.3, 10), Some(0.1));
    }

    #[test]
    fn test_interp_segment_flat() {
        let y = interp_segment(100u64, 200, 2.5f64, 2.5, 137).unwrap();
        assert_eq!(y, 2.5);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0), "1");
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(2.0 / 6.0), "0.333333");
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(12.25), "12.25");
    }

    #[test]
    fn test_cm_to_morgans() {
        assert_float_eq(cm_to_morgans(4.0f64), 0.04, 1e-15);
        assert_float_eq(cm_to_morgans(1.0f32), 0.01, 1e-7);
    }
}
