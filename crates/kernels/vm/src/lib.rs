//! rexpr VM - compile once, evaluate many times
//!
//! Lowers an expression tree ([`Node`]) into a flat, loop-free instruction
//! sequence ([`Program`]) and evaluates it against per-caller [`Context`]s.
//!
//! ```ignore
//! use rexpr_vm::{Node, Operator, Program};
//!
//! let tree = Node::op(Operator::Add, Node::param(0), Node::Number(1.0));
//! let program = Program::compile(&tree, 1)?;
//! let mut ctx = program.context();
//! ctx.bind(0, 41.0);
//! assert_eq!(program.eval(&mut ctx).as_double(), 42.0);
//! ```
//!
//! A program is immutable and `Sync`; evaluate it from as many threads as
//! needed, each with its own context.

pub mod ast;
pub mod bytecode;
mod compiler;
pub mod config;
pub mod error;
mod executor;
pub mod program;

pub use ast::{Function, Node, Operator, TensorCell, Traversal};
pub use bytecode::{Instruction, OpcodeKind, Operand};
pub use config::VmConfig;
pub use error::{CompileError, CompileResult, ConfigError};
pub use program::{Context, Program};
pub use rexpr_foundation::Value;
