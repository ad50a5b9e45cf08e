//! rexpr Operation Catalog
//!
//! Every operator a compiled expression can apply, registered into
//! [`rexpr_kernel_registry::OPERATIONS`]. Each operation is also exposed as a
//! `pub static` descriptor so the compiler can bind it without a name lookup.
//!
//! Operations lift scalar functions over values: a tensor operand is mapped
//! cell by cell, two tensors are joined, and an error operand yields an error.

/// Register a unary operation under a public static name.
macro_rules! unary_operation {
    ($static:ident, $name:literal, $signature:expr, $category:literal, $doc:literal, $f:path) => {
        #[doc = $doc]
        #[linkme::distributed_slice(rexpr_kernel_registry::OPERATIONS)]
        pub static $static: rexpr_kernel_registry::OperationDescriptor =
            rexpr_kernel_registry::OperationDescriptor {
                name: $name,
                signature: $signature,
                doc: $doc,
                category: $category,
                implementation: rexpr_kernel_registry::OperationImpl::Unary($f),
            };
    };
}

/// Register a binary operation under a public static name.
macro_rules! binary_operation {
    ($static:ident, $name:literal, $signature:expr, $category:literal, $doc:literal, $f:path) => {
        #[doc = $doc]
        #[linkme::distributed_slice(rexpr_kernel_registry::OPERATIONS)]
        pub static $static: rexpr_kernel_registry::OperationDescriptor =
            rexpr_kernel_registry::OperationDescriptor {
                name: $name,
                signature: $signature,
                doc: $doc,
                category: $category,
                implementation: rexpr_kernel_registry::OperationImpl::Binary($f),
            };
    };
}

pub mod arithmetic;
pub mod compare;
mod lift;
pub mod logic;
pub mod math;

pub use rexpr_kernel_registry::{all_names, eval, get, is_known, OperationDescriptor};
