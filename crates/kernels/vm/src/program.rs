//! Compiled programs and evaluation contexts.
//!
//! A [`Program`] is immutable once compiled and can be shared across threads.
//! Each thread evaluates it through its own [`Context`], which holds the
//! parameter bindings and the reusable evaluation buffers.

use std::fmt;
use std::sync::Arc;

use rexpr_foundation::{SimpleTensorEngine, TensorEngine, Value};
use tracing::{trace, warn};

use crate::ast::Node;
use crate::bytecode::{ConstId, DimensionId, Instruction, Operand};
use crate::compiler;
use crate::config::VmConfig;
use crate::error::{CompileError, CompileResult};
use crate::executor::{self, State};

/// Instructions plus the tables they reference.
#[derive(Debug)]
pub struct Program {
    pub(crate) instructions: Vec<Instruction>,
    pub(crate) constants: Vec<Value>,
    pub(crate) dimensions: Vec<String>,
    pub(crate) num_params: usize,
    pub(crate) max_stack_depth: usize,
    pub(crate) max_let_depth: usize,
    pub(crate) engine: Arc<dyn TensorEngine>,
}

impl Program {
    /// Compile `root` with default limits and the bundled tensor engine.
    ///
    /// # Errors
    ///
    /// See [`CompileError`].
    pub fn compile(root: &Node, num_params: usize) -> CompileResult<Self> {
        Self::compile_with_config(root, num_params, &VmConfig::default())
    }

    /// Compile `root` under explicit limits.
    pub fn compile_with_config(
        root: &Node,
        num_params: usize,
        config: &VmConfig,
    ) -> CompileResult<Self> {
        Self::compile_with_engine(root, num_params, config, Arc::new(SimpleTensorEngine))
    }

    /// Compile `root` under explicit limits against a specific tensor engine.
    ///
    /// Tensor literals are materialised by `engine` once, here, and the same
    /// engine performs every reduction during evaluation.
    pub fn compile_with_engine(
        root: &Node,
        num_params: usize,
        config: &VmConfig,
        engine: Arc<dyn TensorEngine>,
    ) -> CompileResult<Self> {
        compiler::compile(root, num_params, config, engine)
    }

    /// Evaluate against `ctx` and return the result, which stays valid until
    /// the context is used again.
    ///
    /// # Panics
    ///
    /// Panics if `ctx` was built for a different parameter count.
    pub fn eval<'c>(&self, ctx: &'c mut Context) -> &'c Value {
        assert_eq!(
            ctx.params.len(),
            self.num_params,
            "context binds {} parameters, program expects {}",
            ctx.params.len(),
            self.num_params
        );
        let state = &mut ctx.state;
        state.reset(self.max_stack_depth, self.max_let_depth);
        executor::run(self, &ctx.params, state);

        if state.stack.len() != 1 {
            warn!(
                depth = state.stack.len(),
                instructions = self.instructions.len(),
                "evaluation ended with unexpected stack depth"
            );
            state.stack.clear();
            state.stack.push(Value::Error);
        }
        trace!(result = %state.stack[0], if_count = state.if_count, "evaluated");
        &state.stack[0]
    }

    /// A context sized for this program, every parameter bound to `0.0`.
    pub fn context(&self) -> Context {
        Context::new(self.num_params)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn num_params(&self) -> usize {
        self.num_params
    }

    /// The constant pool. Never reset between evaluations.
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Interned dimension names referenced by `tensor_sum_dim`.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Deepest operand stack any path through the program reaches.
    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }

    /// Most let bindings simultaneously alive.
    pub fn max_let_depth(&self) -> usize {
        self.max_let_depth
    }

    pub fn engine(&self) -> &dyn TensorEngine {
        self.engine.as_ref()
    }

    pub(crate) fn constant(&self, id: ConstId) -> &Value {
        &self.constants[id.0 as usize]
    }

    pub(crate) fn dimension(&self, id: DimensionId) -> &str {
        &self.dimensions[id.0 as usize]
    }

    /// Static checks on a finished program: operand shapes match the opcode
    /// table, table indices are in range, and every jump lands in `[0, len]`.
    pub(crate) fn verify(&self) -> CompileResult<()> {
        let len = self.instructions.len();
        let invalid = |index: usize, message: String| CompileError::InvalidProgram { index, message };

        for (index, instruction) in self.instructions.iter().enumerate() {
            let meta = instruction.kind.metadata();
            let shape = instruction.operand.shape();
            if shape != meta.operand {
                return Err(invalid(
                    index,
                    format!("{} expects a {:?} operand, found {:?}", meta.name, meta.operand, shape),
                ));
            }
            match instruction.operand {
                Operand::Offset(offset) => {
                    let target = index + 1 + offset as usize;
                    if target > len {
                        return Err(invalid(
                            index,
                            format!("jump target {target} beyond program end {len}"),
                        ));
                    }
                }
                Operand::Const(id) if id.0 as usize >= self.constants.len() => {
                    return Err(invalid(index, format!("constant {} out of range", id.0)));
                }
                Operand::Dimension(id) if id.0 as usize >= self.dimensions.len() => {
                    return Err(invalid(index, format!("dimension {} out of range", id.0)));
                }
                Operand::Param(slot) if slot as usize >= self.num_params => {
                    return Err(invalid(index, format!("parameter {slot} out of range")));
                }
                Operand::Let(offset) if offset as usize >= self.max_let_depth => {
                    return Err(invalid(index, format!("let offset {offset} out of range")));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "; {} instructions, {} params, stack {}, lets {}",
            self.instructions.len(),
            self.num_params,
            self.max_stack_depth,
            self.max_let_depth
        )?;
        for (index, instruction) in self.instructions.iter().enumerate() {
            write!(f, "{index:4}: {instruction}")?;
            match instruction.operand {
                Operand::Const(id) => write!(f, "  ; {}", self.constant(id))?,
                Operand::Dimension(id) => write!(f, "  ; {}", self.dimension(id))?,
                Operand::Offset(offset) => {
                    write!(f, "  ; -> {}", index + 1 + offset as usize)?
                }
                _ => {}
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parameter bindings plus the per-evaluation buffers.
///
/// A context belongs to one caller at a time. It can be reused for any
/// number of evaluations of programs with the same parameter count.
#[derive(Debug, Default)]
pub struct Context {
    params: Vec<Value>,
    state: State,
}

impl Context {
    /// A context with `num_params` parameters, each bound to `0.0`.
    pub fn new(num_params: usize) -> Self {
        Self::with_params(vec![Value::Double(0.0); num_params])
    }

    /// A context with the given bindings.
    pub fn with_params(params: Vec<Value>) -> Self {
        Self {
            params,
            state: State::default(),
        }
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    /// Rebind parameter `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn bind(&mut self, index: usize, value: impl Into<Value>) {
        self.params[index] = value.into();
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Conditionals evaluated by the last evaluation.
    pub fn if_count(&self) -> usize {
        self.state.if_count
    }
}
