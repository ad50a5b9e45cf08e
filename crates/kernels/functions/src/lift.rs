//! Lifting scalar functions over [`Value`]s.

use rexpr_foundation::Value;

/// Apply `f` to a scalar, or to every cell of a tensor.
pub(crate) fn map(v: &Value, f: impl Fn(f64) -> f64) -> Value {
    match v {
        Value::Double(x) => Value::Double(f(*x)),
        Value::Tensor(t) => Value::tensor(t.map(f)),
        Value::Error => Value::Error,
    }
}

/// Apply `f` pairwise: scalar/scalar directly, scalar/tensor by mapping the
/// tensor, tensor/tensor by sparse join. Operand order is preserved.
pub(crate) fn join(a: &Value, b: &Value, f: impl Fn(f64, f64) -> f64) -> Value {
    match (a, b) {
        (Value::Error, _) | (_, Value::Error) => Value::Error,
        (Value::Double(x), Value::Double(y)) => Value::Double(f(*x, *y)),
        (Value::Tensor(t), Value::Double(y)) => Value::tensor(t.map(|x| f(x, *y))),
        (Value::Double(x), Value::Tensor(t)) => Value::tensor(t.map(|y| f(*x, y))),
        (Value::Tensor(s), Value::Tensor(t)) => Value::tensor(s.join(t, f)),
    }
}

#[inline]
pub(crate) fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
