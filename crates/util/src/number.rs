//! Arithmetic on JSON numbers.
//!
//! Integer operands stay integral as long as the result fits in `i64`;
//! anything else falls back to `f64`.

use serde_json::Number;

/// Numeric equality. `2` and `2.0` are equal.
pub fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Build a number from a float, preferring an integer representation when
/// the value is whole. Returns `None` for NaN and infinities.
pub fn number_from_f64(f: f64) -> Option<Number> {
    if !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return Some(Number::from(f as i64));
    }
    Number::from_f64(f)
}

/// Sum of two numbers.
///
/// ```
/// use serde_json::Number;
/// use json_sync_util::add_numbers;
///
/// let sum = add_numbers(&Number::from(10), &Number::from(6)).unwrap();
/// assert_eq!(sum.as_i64(), Some(16));
/// ```
pub fn add_numbers(a: &Number, b: &Number) -> Option<Number> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Some(Number::from(sum));
        }
    }
    number_from_f64(a.as_f64()? + b.as_f64()?)
}

/// Additive inverse.
pub fn negate_number(n: &Number) -> Option<Number> {
    if let Some(x) = n.as_i64() {
        if let Some(neg) = x.checked_neg() {
            return Some(Number::from(neg));
        }
    }
    number_from_f64(-n.as_f64()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_sum_stays_integral() {
        let sum = add_numbers(&Number::from(5), &Number::from(-7)).unwrap();
        assert_eq!(sum.as_i64(), Some(-2));
    }

    #[test]
    fn test_float_sum() {
        let a = Number::from_f64(0.5).unwrap();
        let sum = add_numbers(&a, &Number::from(1)).unwrap();
        assert_eq!(sum.as_f64(), Some(1.5));
    }

    #[test]
    fn test_whole_float_sum_becomes_integer() {
        let a = Number::from_f64(1.5).unwrap();
        let b = Number::from_f64(2.5).unwrap();
        assert_eq!(add_numbers(&a, &b).unwrap().as_i64(), Some(4));
    }

    #[test]
    fn test_overflow_falls_back_to_float() {
        let sum = add_numbers(&Number::from(i64::MAX), &Number::from(1)).unwrap();
        assert!(sum.as_i64().is_none());
        assert!(sum.as_f64().unwrap() > 9.0e18);
    }

    #[test]
    fn test_negate() {
        assert_eq!(negate_number(&Number::from(3)).unwrap().as_i64(), Some(-3));
        let half = Number::from_f64(0.5).unwrap();
        assert_eq!(negate_number(&half).unwrap().as_f64(), Some(-0.5));
    }

    #[test]
    fn test_numbers_equal() {
        assert!(numbers_equal(&Number::from(2), &Number::from_f64(2.0).unwrap()));
        assert!(!numbers_equal(&Number::from(2), &Number::from(3)));
    }
}
