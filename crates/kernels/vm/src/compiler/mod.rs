//! Lowering of expression trees into programs.
//!
//! # Compilation Strategy
//!
//! 1. Walk the tree once. Each node's [`Traversal`] decides whether its
//!    children are lowered first (post-order) or by the node's own rule.
//! 2. Forward jumps are emitted with a zero offset and recorded as pending;
//!    they are patched as soon as the landing point has been emitted.
//! 3. Operand-stack and let-stack depths are tracked statically from the
//!    opcode table, so contexts can size their buffers up front.
//! 4. The finished program is verified against the opcode table.
//!
//! Symbols are resolved here and never at run time: a let reference becomes
//! an offset from the innermost binding, which the let stack mirrors exactly
//! because every `store_let` is paired with an `evict_let`.

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexSet;
use rexpr_foundation::{hash_string, Address, TensorEngine, TensorSpec, Value};
use rexpr_functions::{arithmetic, logic};
use rexpr_kernel_registry::OperationDescriptor;
use tracing::{debug, instrument, warn};

use crate::ast::{Node, TensorCell, Traversal};
use crate::bytecode::{BinaryOp, ConstId, DimensionId, Instruction, OpcodeKind, Operand, UnaryOp};
use crate::config::VmConfig;
use crate::error::{CompileError, CompileResult};
use crate::program::Program;

/// Compile `root` into a verified program.
#[instrument(skip_all, fields(num_params = num_params, max_nesting_depth = config.max_nesting_depth))]
pub(crate) fn compile(
    root: &Node,
    num_params: usize,
    config: &VmConfig,
    engine: Arc<dyn TensorEngine>,
) -> CompileResult<Program> {
    let mut compiler = Compiler::new(num_params, config, engine.as_ref());
    compiler.compile_node(root)?;
    compiler.finish(Arc::clone(&engine))
}

/// Single-pass lowering state.
struct Compiler<'a> {
    config: &'a VmConfig,
    engine: &'a dyn TensorEngine,
    num_params: usize,
    instructions: Vec<Instruction>,
    constants: Vec<Value>,
    dimensions: IndexSet<String>,
    /// Indices of jumps still carrying a placeholder offset.
    pending: BTreeSet<usize>,
    nesting: usize,
    let_depth: usize,
    max_let_depth: usize,
    stack_depth: usize,
    max_stack_depth: usize,
}

impl<'a> Compiler<'a> {
    fn new(num_params: usize, config: &'a VmConfig, engine: &'a dyn TensorEngine) -> Self {
        Self {
            config,
            engine,
            num_params,
            instructions: Vec::new(),
            constants: Vec::new(),
            dimensions: IndexSet::new(),
            pending: BTreeSet::new(),
            nesting: 0,
            let_depth: 0,
            max_let_depth: 0,
            stack_depth: 0,
            max_stack_depth: 0,
        }
    }

    fn compile_node(&mut self, node: &Node) -> CompileResult<()> {
        self.nesting += 1;
        if self.nesting > self.config.max_nesting_depth {
            return Err(CompileError::NestingTooDeep {
                limit: self.config.max_nesting_depth,
                kind: node.kind_name(),
            });
        }
        if node.traversal() == Traversal::PostOrder {
            for child in node.children() {
                self.compile_node(child)?;
            }
        }
        self.lower(node)?;
        self.nesting -= 1;
        Ok(())
    }

    /// Emit the node's own instructions. Post-order children are already on
    /// the stack; custom kinds lower their children here.
    fn lower(&mut self, node: &Node) -> CompileResult<()> {
        match node {
            Node::Number(value) => self.emit_const(Value::Double(*value)),
            Node::String(text) => self.emit_const(Value::Double(hash_string(text))),
            Node::Error => self.emit_const(Value::Error),
            Node::Array(items) => self.emit_const(Value::Double(items.len() as f64)),
            Node::Symbol(id) => self.lower_symbol(*id),
            Node::Tensor(cells) => {
                let value = self.tensor_literal(cells);
                self.emit_const(value)
            }
            Node::Neg(_) => self.emit_operation(&arithmetic::NEG, 1),
            Node::Not(_) => self.emit_operation(&logic::NOT, 1),
            Node::Operator { op, .. } => self.emit_operation(op.operation(), 2),
            Node::Call { function, args } => self.emit_operation(function.operation(), args.len()),
            Node::Apply { operation, args } => self.emit_operation(*operation, args.len()),
            Node::TensorMatch { .. } => self.emit_operation(&arithmetic::MUL, 2),
            Node::TensorSum { dimension, .. } => match dimension {
                None => self.emit(OpcodeKind::TensorSum, Operand::None).map(drop),
                Some(name) => {
                    let id = self.intern_dimension(name)?;
                    self.emit(OpcodeKind::TensorSumDim, Operand::Dimension(id))
                        .map(drop)
                }
            },
            Node::If {
                cond,
                true_expr,
                false_expr,
            } => self.lower_if(cond, true_expr, false_expr),
            Node::Let { value, expr, .. } => self.lower_let(value, expr),
            Node::In { lhs, rhs } => self.lower_in(lhs, rhs),
        }
    }

    fn lower_symbol(&mut self, id: i32) -> CompileResult<()> {
        if id >= 0 {
            if id as usize >= self.num_params {
                return Err(CompileError::ParamOutOfRange {
                    id,
                    num_params: self.num_params,
                });
            }
            self.emit(OpcodeKind::LoadParam, Operand::Param(id as u32))?;
        } else {
            let offset = (-(id + 1)) as usize;
            if offset >= self.let_depth {
                return Err(CompileError::UnboundLet {
                    id,
                    active: self.let_depth,
                });
            }
            self.emit(OpcodeKind::LoadLet, Operand::Let(offset as u32))?;
        }
        Ok(())
    }

    /// cond; skip_if_false; true branch; skip; false branch.
    fn lower_if(&mut self, cond: &Node, true_expr: &Node, false_expr: &Node) -> CompileResult<()> {
        self.compile_node(cond)?;
        let skip_if_false = self.emit_jump(OpcodeKind::SkipIfFalse)?;
        let depth = self.stack_depth;
        self.compile_node(true_expr)?;
        let skip = self.emit_jump(OpcodeKind::Skip)?;
        self.patch_jump(skip_if_false)?;
        // the false branch starts from the stack the true branch started from
        self.stack_depth = depth;
        self.compile_node(false_expr)?;
        self.patch_jump(skip)
    }

    /// value; store_let; body; evict_let.
    fn lower_let(&mut self, value: &Node, expr: &Node) -> CompileResult<()> {
        self.compile_node(value)?;
        self.emit(OpcodeKind::StoreLet, Operand::None)?;
        self.let_depth += 1;
        self.max_let_depth = self.max_let_depth.max(self.let_depth);
        self.compile_node(expr)?;
        self.let_depth -= 1;
        self.emit(OpcodeKind::EvictLet, Operand::None)?;
        Ok(())
    }

    /// lhs; (candidate; check_member)*; not_member. Every check lands just
    /// past the `not_member`.
    fn lower_in(&mut self, lhs: &Node, rhs: &Node) -> CompileResult<()> {
        self.compile_node(lhs)?;
        let candidates: Vec<&Node> = match rhs {
            Node::Array(items) => items.iter().collect(),
            single => vec![single],
        };
        let mut checks = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            self.compile_node(candidate)?;
            checks.push(self.emit_jump(OpcodeKind::CheckMember)?);
        }
        self.emit(OpcodeKind::NotMember, Operand::None)?;
        for check in checks {
            self.patch_jump(check)?;
        }
        Ok(())
    }

    /// Materialise a tensor literal over the union of its cells' dimensions.
    fn tensor_literal(&self, cells: &[TensorCell]) -> Value {
        let dimensions: BTreeSet<&str> = cells
            .iter()
            .flat_map(|cell| cell.address.iter().map(|(d, _)| d.as_str()))
            .collect();
        let mut spec = TensorSpec::new(dimensions);
        for cell in cells {
            let address: Address = cell.address.iter().cloned().collect();
            spec.add(address, cell.value);
        }
        match self.engine.create(&spec) {
            Ok(tensor) => Value::tensor(tensor),
            Err(err) => {
                warn!(error = %err, "tensor literal rejected by engine");
                Value::Error
            }
        }
    }

    fn emit_operation(
        &mut self,
        descriptor: &'static OperationDescriptor,
        args: usize,
    ) -> CompileResult<()> {
        if args != descriptor.arity() {
            return Err(CompileError::ArityMismatch {
                function: descriptor.name,
                expected: descriptor.arity(),
                found: args,
            });
        }
        let (kind, operand) = match (UnaryOp::bind(descriptor), BinaryOp::bind(descriptor)) {
            (Some(op), _) => (OpcodeKind::Unary, Operand::Unary(op)),
            (None, Some(op)) => (OpcodeKind::Binary, Operand::Binary(op)),
            (None, None) => unreachable!("operation {} has no implementation", descriptor.name),
        };
        self.emit(kind, operand)?;
        Ok(())
    }

    fn emit_const(&mut self, value: Value) -> CompileResult<()> {
        let id = ConstId(self.index_u32(self.constants.len())?);
        self.constants.push(value);
        self.emit(OpcodeKind::LoadConst, Operand::Const(id))?;
        Ok(())
    }

    fn intern_dimension(&mut self, name: &str) -> CompileResult<DimensionId> {
        let (index, _) = self.dimensions.insert_full(name.to_string());
        Ok(DimensionId(self.index_u32(index)?))
    }

    /// Append an instruction, tracking the static stack depth.
    fn emit(&mut self, kind: OpcodeKind, operand: Operand) -> CompileResult<usize> {
        let index = self.instructions.len();
        if index >= self.config.max_program_size {
            return Err(CompileError::ProgramTooLarge {
                limit: self.config.max_program_size,
            });
        }
        let meta = kind.metadata();
        self.stack_depth = self.stack_depth.checked_sub(meta.pops).ok_or_else(|| {
            CompileError::InvalidProgram {
                index,
                message: format!("{} would underflow the operand stack", meta.name),
            }
        })? + meta.pushes;
        self.max_stack_depth = self.max_stack_depth.max(self.stack_depth);
        self.instructions.push(Instruction::new(kind, operand));
        Ok(index)
    }

    /// Emit a jump with a placeholder offset.
    fn emit_jump(&mut self, kind: OpcodeKind) -> CompileResult<usize> {
        let index = self.emit(kind, Operand::Offset(0))?;
        self.pending.insert(index);
        Ok(index)
    }

    /// Point the pending jump at `at` to the next instruction to be emitted.
    ///
    /// # Panics
    ///
    /// Panics if `at` is not a pending jump.
    fn patch_jump(&mut self, at: usize) -> CompileResult<()> {
        assert!(self.pending.remove(&at), "jump at {at} is not pending");
        let offset = self.index_u32(self.instructions.len() - (at + 1))?;
        match &mut self.instructions[at].operand {
            Operand::Offset(placeholder) => *placeholder = offset,
            _ => panic!("attempted to patch non-jump instruction at {at}"),
        }
        Ok(())
    }

    fn index_u32(&self, index: usize) -> CompileResult<u32> {
        u32::try_from(index).map_err(|_| CompileError::ProgramTooLarge {
            limit: self.config.max_program_size,
        })
    }

    fn finish(self, engine: Arc<dyn TensorEngine>) -> CompileResult<Program> {
        if let Some(&index) = self.pending.first() {
            return Err(CompileError::InvalidProgram {
                index,
                message: "jump was never patched".to_string(),
            });
        }
        debug_assert_eq!(self.stack_depth, 1, "a tree lowers to exactly one value");
        let program = Program {
            instructions: self.instructions,
            constants: self.constants,
            dimensions: self.dimensions.into_iter().collect(),
            num_params: self.num_params,
            max_stack_depth: self.max_stack_depth,
            max_let_depth: self.max_let_depth,
            engine,
        };
        program.verify()?;
        debug!(
            instructions = program.instructions.len(),
            constants = program.constants.len(),
            max_stack_depth = program.max_stack_depth,
            max_let_depth = program.max_let_depth,
            "compiled program"
        );
        Ok(program)
    }
}
