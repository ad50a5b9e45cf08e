//! Comparison Operations
//!
//! All comparisons yield `1.0` for true and `0.0` for false, cell by cell when
//! an operand is a tensor.

use rexpr_foundation::Value;

use crate::lift::{join, truth};

const APPROX_EPSILON: f64 = 9.5367431640625e-7; // 2^-20

/// Relative equality: exact matches always pass, NaN never does.
pub fn approx_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if a.is_nan() || b.is_nan() {
        return false;
    }
    (a - b).abs() <= a.abs().max(b.abs()) * APPROX_EPSILON
}

fn equal(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| truth(x == y))
}

fn not_equal(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| truth(x != y))
}

fn approx(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| truth(approx_equal(x, y)))
}

fn less(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| truth(x < y))
}

fn less_equal(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| truth(x <= y))
}

fn greater(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| truth(x > y))
}

fn greater_equal(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| truth(x >= y))
}

binary_operation!(EQUAL, "equal", "a == b", "compare", "Exact equality", equal);
binary_operation!(
    NOT_EQUAL,
    "not_equal",
    "a != b",
    "compare",
    "Exact inequality",
    not_equal
);
binary_operation!(
    APPROX,
    "approx",
    "a ~= b",
    "compare",
    "Relative equality within 2^-20 of the larger magnitude",
    approx
);
binary_operation!(LESS, "less", "a < b", "compare", "Strictly less", less);
binary_operation!(
    LESS_EQUAL,
    "less_equal",
    "a <= b",
    "compare",
    "Less or equal",
    less_equal
);
binary_operation!(GREATER, "greater", "a > b", "compare", "Strictly greater", greater);
binary_operation!(
    GREATER_EQUAL,
    "greater_equal",
    "a >= b",
    "compare",
    "Greater or equal",
    greater_equal
);

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: f64) -> Value {
        Value::Double(v)
    }

    #[test]
    fn test_ordering() {
        assert_eq!(less(&d(1.0), &d(2.0)), d(1.0));
        assert_eq!(less(&d(2.0), &d(1.0)), d(0.0));
        assert_eq!(less_equal(&d(2.0), &d(2.0)), d(1.0));
        assert_eq!(greater(&d(2.0), &d(1.0)), d(1.0));
        assert_eq!(greater_equal(&d(1.0), &d(2.0)), d(0.0));
    }

    #[test]
    fn test_equality() {
        assert_eq!(equal(&d(3.0), &d(3.0)), d(1.0));
        assert_eq!(not_equal(&d(3.0), &d(3.0)), d(0.0));
        assert_eq!(equal(&d(f64::NAN), &d(f64::NAN)), d(0.0));
    }

    #[test]
    fn test_approx() {
        assert!(approx_equal(1.0, 1.0 + 1e-9));
        assert!(!approx_equal(1.0, 1.001));
        assert!(approx_equal(0.0, 0.0));
        assert!(approx_equal(f64::INFINITY, f64::INFINITY));
        assert!(!approx_equal(f64::NAN, f64::NAN));
        assert_eq!(approx(&d(1e6), &d(1e6 + 0.5)), d(1.0));
    }

    #[test]
    fn test_error_operand() {
        assert_eq!(less(&Value::Error, &d(1.0)), Value::Error);
    }
}
