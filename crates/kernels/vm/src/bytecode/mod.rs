//! Instruction set.
//!
//! Instructions are data: an [`OpcodeKind`] plus one tagged [`Operand`].
//! Stack effects, operand shapes and handlers live in one table in
//! [`registry`], shared by the compiler, the verifier and the executor.

pub mod opcode;
pub mod operand;
pub(crate) mod registry;

pub use opcode::{Instruction, OpcodeKind, OpcodeMetadata};
pub use operand::{BinaryOp, ConstId, DimensionId, Operand, OperandShape, UnaryOp};
