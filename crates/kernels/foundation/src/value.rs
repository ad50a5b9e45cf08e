use std::fmt;
use std::sync::Arc;

use crate::tensor::Tensor;

/// Runtime value produced and consumed by the evaluator.
///
/// Values are immutable. Tensors are reference counted, so pushing a tensor
/// constant onto an operand stack shares it instead of copying its cells.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Numeric scalar. Booleans are `1.0` / `0.0`.
    Double(f64),
    /// Sparse tensor.
    Tensor(Arc<Tensor>),
    /// Marker for an operation that could not produce a meaningful result.
    Error,
}

impl Value {
    /// Wrap a tensor.
    pub fn tensor(tensor: Tensor) -> Self {
        Value::Tensor(Arc::new(tensor))
    }

    /// Boolean as `1.0` / `0.0`.
    pub fn from_bool(b: bool) -> Self {
        Value::Double(if b { 1.0 } else { 0.0 })
    }

    /// Scalar view of the value.
    ///
    /// Tensors collapse to the sum of their cells; errors are NaN.
    pub fn as_double(&self) -> f64 {
        match self {
            Value::Double(v) => *v,
            Value::Tensor(t) => t.sum(),
            Value::Error => f64::NAN,
        }
    }

    /// Truthiness used by conditionals: anything whose scalar view is not zero.
    pub fn as_bool(&self) -> bool {
        self.as_double() != 0.0
    }

    /// Attempt to get the value as a tensor.
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Value::Tensor(t) => Some(t),
            _ => None,
        }
    }

    /// True for [`Value::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error)
    }

    /// Evaluation-level equality used by set membership.
    ///
    /// Unlike `==`, an error is never equal to anything, itself included.
    pub fn equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Tensor(a), Value::Tensor(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Double(0.0)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::from_bool(b)
    }
}

impl From<Tensor> for Value {
    fn from(t: Tensor) -> Self {
        Value::tensor(t)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Double(v) => write!(f, "{v}"),
            Value::Tensor(t) => write!(f, "{t}"),
            Value::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::TensorSpec;

    fn tensor() -> Value {
        let spec = TensorSpec::new(["d"])
            .with_cell([("d", "a")], 2.0)
            .with_cell([("d", "b")], 3.0);
        Value::tensor(Tensor::from_spec(&spec).unwrap())
    }

    #[test]
    fn test_as_double() {
        assert_eq!(Value::Double(1.5).as_double(), 1.5);
        assert_eq!(tensor().as_double(), 5.0);
        assert!(Value::Error.as_double().is_nan());
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Double(-1.0).as_bool());
        assert!(!Value::Double(0.0).as_bool());
        assert!(Value::Error.as_bool());
        assert!(tensor().as_bool());
    }

    #[test]
    fn test_equal() {
        assert!(Value::Double(2.0).equal(&Value::Double(2.0)));
        assert!(!Value::Double(2.0).equal(&Value::Double(3.0)));
        assert!(tensor().equal(&tensor()));
        assert!(!tensor().equal(&Value::Double(5.0)));
        assert!(!Value::Error.equal(&Value::Error));
    }

    #[test]
    fn test_clone_shares_tensor() {
        let a = tensor();
        let b = a.clone();
        match (&a, &b) {
            (Value::Tensor(x), Value::Tensor(y)) => assert!(Arc::ptr_eq(x, y)),
            _ => panic!("expected tensors"),
        }
    }
}
