//! Tensor engine seam.
//!
//! The compiler materialises tensor literals through a [`TensorEngine`] and
//! the evaluator reduces tensors through the same engine, so an alternative
//! tensor representation only has to implement this trait.

use std::fmt;

use crate::tensor::{Combine, Tensor, TensorError, TensorSpec};
use crate::value::Value;

/// Creation, reduction and comparison of tensors.
///
/// Implementations must be shareable across threads: a compiled program holds
/// one engine handle and is evaluated concurrently.
pub trait TensorEngine: fmt::Debug + Send + Sync {
    /// Materialise a tensor from a sparse spec.
    ///
    /// # Errors
    ///
    /// Returns an error if the `TensorSpec` is internally inconsistent.
    fn create(&self, spec: &TensorSpec) -> Result<Tensor, TensorError>;

    /// Reduce `tensor` over `dimensions` (all dimensions when empty).
    ///
    /// Never fails: a dimension the tensor does not have yields
    /// [`Value::Error`].
    fn reduce(&self, tensor: &Tensor, combine: Combine, dimensions: &[&str]) -> Value;

    /// Cell-wise equality.
    fn equal(&self, lhs: &Tensor, rhs: &Tensor) -> bool;
}

/// Reference engine backed by [`Tensor`]'s sparse representation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleTensorEngine;

impl TensorEngine for SimpleTensorEngine {
    fn create(&self, spec: &TensorSpec) -> Result<Tensor, TensorError> {
        Tensor::from_spec(spec)
    }

    fn reduce(&self, tensor: &Tensor, combine: Combine, dimensions: &[&str]) -> Value {
        tensor.reduce(combine, dimensions).unwrap_or(Value::Error)
    }

    fn equal(&self, lhs: &Tensor, rhs: &Tensor) -> bool {
        lhs == rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_unknown_dimension_is_error_value() {
        let engine = SimpleTensorEngine;
        let t = engine
            .create(&TensorSpec::new(["d"]).with_cell([("d", "a")], 1.0))
            .unwrap();
        assert_eq!(engine.reduce(&t, |a, b| a + b, &["nope"]), Value::Error);
        assert_eq!(engine.reduce(&t, |a, b| a + b, &["d"]), Value::Double(1.0));
    }

    #[test]
    fn test_engine_is_object_safe() {
        let engine: Box<dyn TensorEngine> = Box::new(SimpleTensorEngine);
        let a = engine.create(&TensorSpec::new(["d"])).unwrap();
        let b = engine.create(&TensorSpec::new(["d"])).unwrap();
        assert!(engine.equal(&a, &b));
    }
}
