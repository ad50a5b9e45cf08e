//! rexpr Foundation
//!
//! Runtime value model shared by the operation catalog and the evaluator:
//! the closed [`Value`] union, sparse [`Tensor`]s built from a
//! [`TensorSpec`], the [`TensorEngine`] seam used to materialise and reduce
//! them, and stable string hashing for string literals.

pub mod engine;
pub mod stable_hash;
pub mod tensor;
pub mod value;

pub use engine::{SimpleTensorEngine, TensorEngine};
pub use stable_hash::{fnv1a64, fnv1a64_str, hash_string};
pub use tensor::{Address, Combine, Tensor, TensorError, TensorSpec};
pub use value::Value;
