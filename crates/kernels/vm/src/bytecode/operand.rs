//! Operand encoding for instructions.

use std::fmt;

use rexpr_kernel_registry::{BinaryFn, OperationDescriptor, UnaryFn};

/// Index into a program's constant pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstId(pub u32);

/// Index into a program's interned dimension names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimensionId(pub u32);

/// A unary catalog operation bound at compile time.
#[derive(Clone, Copy)]
pub struct UnaryOp {
    /// Catalog name, for disassembly.
    pub name: &'static str,
    pub apply: UnaryFn,
}

/// A binary catalog operation bound at compile time.
#[derive(Clone, Copy)]
pub struct BinaryOp {
    /// Catalog name, for disassembly.
    pub name: &'static str,
    /// Called as `apply(left, right)`.
    pub apply: BinaryFn,
}

impl UnaryOp {
    /// Bind a descriptor, if it is unary.
    pub fn bind(descriptor: &'static OperationDescriptor) -> Option<Self> {
        descriptor.unary().map(|apply| Self {
            name: descriptor.name,
            apply,
        })
    }
}

impl BinaryOp {
    /// Bind a descriptor, if it is binary.
    pub fn bind(descriptor: &'static OperationDescriptor) -> Option<Self> {
        descriptor.binary().map(|apply| Self {
            name: descriptor.name,
            apply,
        })
    }
}

impl fmt::Debug for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnaryOp({})", self.name)
    }
}

impl fmt::Debug for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryOp({})", self.name)
    }
}

/// Operand attached to an instruction.
#[derive(Debug, Clone, Copy)]
pub enum Operand {
    /// No operand.
    None,
    /// Forward jump distance, relative to the next instruction.
    Offset(u32),
    /// Parameter slot.
    Param(u32),
    /// Let binding, `0` being the innermost.
    Let(u32),
    /// Constant pool entry.
    Const(ConstId),
    /// Interned dimension name.
    Dimension(DimensionId),
    Unary(UnaryOp),
    Binary(BinaryOp),
}

/// The variant an opcode requires of its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    None,
    Offset,
    Param,
    Let,
    Const,
    Dimension,
    Unary,
    Binary,
}

impl Operand {
    /// Which variant this operand is.
    pub fn shape(&self) -> OperandShape {
        match self {
            Operand::None => OperandShape::None,
            Operand::Offset(_) => OperandShape::Offset,
            Operand::Param(_) => OperandShape::Param,
            Operand::Let(_) => OperandShape::Let,
            Operand::Const(_) => OperandShape::Const,
            Operand::Dimension(_) => OperandShape::Dimension,
            Operand::Unary(_) => OperandShape::Unary,
            Operand::Binary(_) => OperandShape::Binary,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Offset(offset) => write!(f, "+{offset}"),
            Operand::Param(index) => write!(f, "param[{index}]"),
            Operand::Let(offset) => write!(f, "let[{offset}]"),
            Operand::Const(id) => write!(f, "const[{}]", id.0),
            Operand::Dimension(id) => write!(f, "dim[{}]", id.0),
            Operand::Unary(op) => f.write_str(op.name),
            Operand::Binary(op) => f.write_str(op.name),
        }
    }
}
