//! Integration test harness for rexpr.
//!
//! End-to-end helpers for the full pipeline: Build tree → Compile → Evaluate
//! → Verify.

use rexpr_vm::{Context, Node, Program, Value, VmConfig};
use tracing_subscriber::{fmt, EnvFilter};

// Ensure operations are registered
use rexpr_functions as _;

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,rexpr_vm=info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// A compiled program plus one context to evaluate it with.
pub struct TestHarness {
    program: Program,
    ctx: Context,
}

impl TestHarness {
    /// Compile `tree` with default limits.
    ///
    /// # Panics
    ///
    /// Panics if compilation fails.
    pub fn from_tree(tree: &Node, num_params: usize) -> Self {
        Self::with_config(tree, num_params, &VmConfig::default())
    }

    /// Compile `tree` under `config`.
    ///
    /// # Panics
    ///
    /// Panics if compilation fails.
    pub fn with_config(tree: &Node, num_params: usize, config: &VmConfig) -> Self {
        init_logging();
        let program = match Program::compile_with_config(tree, num_params, config) {
            Ok(program) => program,
            Err(err) => panic!("Compilation failed: {err}"),
        };
        let ctx = program.context();
        Self { program, ctx }
    }

    /// Bind parameters in order and evaluate.
    pub fn eval(&mut self, params: &[f64]) -> Value {
        for (index, &value) in params.iter().enumerate() {
            self.ctx.bind(index, value);
        }
        self.program.eval(&mut self.ctx).clone()
    }

    /// Evaluate and collapse the result to a scalar.
    pub fn eval_scalar(&mut self, params: &[f64]) -> f64 {
        self.eval(params).as_double()
    }

    /// Conditionals evaluated by the last evaluation.
    pub fn if_count(&self) -> usize {
        self.ctx.if_count()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }
}
