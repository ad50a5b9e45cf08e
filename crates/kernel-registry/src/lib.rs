//! Operation Registry.
//!
//! Provides distributed registration for the operations a compiled expression
//! can invoke: arithmetic, comparison, logic, and the math functions such as
//! `cos` or `atan2`. Every operation is a pure function over [`Value`]s.
//!
//! # Architecture
//!
//! The registry uses [`linkme::distributed_slice`] for link-time registration:
//!
//! 1. Operations declare a `static` [`OperationDescriptor`] annotated with
//!    `#[distributed_slice(OPERATIONS)]`
//! 2. At link time, all registrations are collected into [`OPERATIONS`]
//! 3. At runtime, the registry provides lookup by name for diagnostics and
//!    tooling
//!
//! The compiler does not look operations up by name. It references the
//! descriptor statics directly and bakes the function pointer into the
//! instruction, so evaluation never consults this table.
//!
//! # Operation Kinds
//!
//! - **Unary** ([`OperationImpl::Unary`]) - one operand, e.g. `neg`, `sqrt`
//! - **Binary** ([`OperationImpl::Binary`]) - two operands in (left, right)
//!   order, e.g. `sub`, `atan2`
//!
//! # Example Lookup
//!
//! ```ignore
//! use rexpr_kernel_registry::{get, is_known};
//! use rexpr_foundation::Value;
//!
//! if is_known("sqrt") {
//!     let result = get("sqrt").unwrap().eval(&[Value::Double(9.0)]);
//! }
//! ```

pub use linkme;

use linkme::distributed_slice;
use rexpr_foundation::Value;

/// Signature for single-operand operations.
pub type UnaryFn = fn(&Value) -> Value;

/// Signature for two-operand operations; arguments are `(left, right)`.
pub type BinaryFn = fn(&Value, &Value) -> Value;

/// The function pointer, tagged by arity.
#[derive(Clone, Copy)]
pub enum OperationImpl {
    /// `fn(&Value) -> Value`
    Unary(UnaryFn),
    /// `fn(&Value, &Value) -> Value`
    Binary(BinaryFn),
}

impl OperationImpl {
    /// Number of operands the operation consumes.
    pub fn arity(&self) -> usize {
        match self {
            OperationImpl::Unary(_) => 1,
            OperationImpl::Binary(_) => 2,
        }
    }
}

/// Descriptor for a registered operation.
pub struct OperationDescriptor {
    /// Lookup name (e.g. "add", "atan2", "isnan")
    pub name: &'static str,
    /// Signature string (e.g. "atan2(y, x)")
    pub signature: &'static str,
    /// Documentation string
    pub doc: &'static str,
    /// Category tag (e.g. "arithmetic", "compare", "logic", "math")
    pub category: &'static str,
    /// The implementation
    pub implementation: OperationImpl,
}

impl OperationDescriptor {
    /// Number of operands.
    pub fn arity(&self) -> usize {
        self.implementation.arity()
    }

    /// Unary implementation, if this is a unary operation.
    pub fn unary(&self) -> Option<UnaryFn> {
        match self.implementation {
            OperationImpl::Unary(f) => Some(f),
            OperationImpl::Binary(_) => None,
        }
    }

    /// Binary implementation, if this is a binary operation.
    pub fn binary(&self) -> Option<BinaryFn> {
        match self.implementation {
            OperationImpl::Binary(f) => Some(f),
            OperationImpl::Unary(_) => None,
        }
    }

    /// Evaluate with a slice of operands.
    ///
    /// Returns [`Value::Error`] if the number of operands does not match the
    /// arity.
    pub fn eval(&self, args: &[Value]) -> Value {
        match (self.implementation, args) {
            (OperationImpl::Unary(f), [a]) => f(a),
            (OperationImpl::Binary(f), [a, b]) => f(a, b),
            _ => Value::Error,
        }
    }
}

impl std::fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("arity", &self.arity())
            .finish()
    }
}

/// Distributed slice collecting all operation registrations.
#[distributed_slice]
pub static OPERATIONS: [OperationDescriptor];

/// Get all registered operation names
pub fn all_names() -> impl Iterator<Item = &'static str> {
    OPERATIONS.iter().map(|op| op.name)
}

/// Look up an operation by name
pub fn get(name: &str) -> Option<&'static OperationDescriptor> {
    OPERATIONS.iter().find(|op| op.name == name)
}

/// Check if a name is a registered operation
pub fn is_known(name: &str) -> bool {
    get(name).is_some()
}

/// Evaluate an operation by name
pub fn eval(name: &str, args: &[Value]) -> Option<Value> {
    get(name).map(|op| op.eval(args))
}
