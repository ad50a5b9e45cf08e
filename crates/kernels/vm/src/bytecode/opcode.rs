//! Opcodes and instructions.
//!
//! Opcode behaviour is defined by the metadata and handler table in
//! [`registry`](super::registry), not by the enum. The set is closed and
//! loop-free: the only control transfers are forward jumps.

use std::fmt;

use super::operand::{Operand, OperandShape};
use super::registry::metadata_for;

/// Instruction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpcodeKind {
    // === Loads ===
    /// Push the constant named by the operand.
    LoadConst,
    /// Push a parameter.
    LoadParam,
    /// Push a let binding, counted from the innermost.
    LoadLet,

    // === Operations ===
    /// Replace the top value with `op(top)`.
    Unary,
    /// Replace the two top values with `op(second, top)`.
    Binary,

    // === Control ===
    /// Jump forward unconditionally.
    Skip,
    /// Pop the condition; jump forward if it is false.
    SkipIfFalse,
    /// Move the top value onto the let stack.
    StoreLet,
    /// Drop the innermost let binding.
    EvictLet,
    /// Pop a candidate; if it equals the probe below it, replace the probe
    /// with `1.0` and jump forward.
    CheckMember,
    /// Replace the probe with `0.0`.
    NotMember,

    // === Tensor ===
    /// Sum a tensor over all dimensions.
    TensorSum,
    /// Sum a tensor over the dimension named by the operand.
    TensorSumDim,
}

impl OpcodeKind {
    /// Every opcode, in table order.
    pub const ALL: [OpcodeKind; 13] = [
        OpcodeKind::LoadConst,
        OpcodeKind::LoadParam,
        OpcodeKind::LoadLet,
        OpcodeKind::Unary,
        OpcodeKind::Binary,
        OpcodeKind::Skip,
        OpcodeKind::SkipIfFalse,
        OpcodeKind::StoreLet,
        OpcodeKind::EvictLet,
        OpcodeKind::CheckMember,
        OpcodeKind::NotMember,
        OpcodeKind::TensorSum,
        OpcodeKind::TensorSumDim,
    ];

    /// Static metadata for this opcode.
    pub fn metadata(self) -> &'static OpcodeMetadata {
        metadata_for(self)
    }

    /// Mnemonic used in disassembly.
    pub fn name(self) -> &'static str {
        self.metadata().name
    }
}

/// Static description of an opcode.
#[derive(Debug, Clone)]
pub struct OpcodeMetadata {
    /// Mnemonic, e.g. `skip_if_false`.
    pub name: &'static str,
    /// Operand variant the opcode requires.
    pub operand: OperandShape,
    /// Values consumed from the operand stack.
    pub pops: usize,
    /// Values produced onto the operand stack.
    ///
    /// `CheckMember` consumes two and leaves one on both of its paths.
    pub pushes: usize,
    /// Whether the operand is a forward jump distance.
    pub jumps: bool,
}

/// A single instruction.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub kind: OpcodeKind,
    pub operand: Operand,
}

impl Instruction {
    pub fn new(kind: OpcodeKind, operand: Operand) -> Self {
        Self { kind, operand }
    }

    /// Jump distance, for jumping opcodes.
    pub fn offset(&self) -> Option<u32> {
        match self.operand {
            Operand::Offset(offset) if self.kind.metadata().jumps => Some(offset),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Operand::None => f.write_str(self.kind.name()),
            operand => write!(f, "{} {}", self.kind.name(), operand),
        }
    }
}
