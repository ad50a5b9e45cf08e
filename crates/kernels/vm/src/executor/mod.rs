//! Instruction executor.
//!
//! # Execution Model
//!
//! A single forward pass over the instruction vector:
//! - fetch the instruction at `pc` and advance `pc`,
//! - dispatch to the opcode's handler through the opcode table,
//! - jumping handlers add their offset to `pc`.
//!
//! Every jump is forward, so a run executes at most `len` instructions.
//! Handlers never fail: anomalies such as reducing a non-tensor become
//! [`Value::Error`] and flow through the stack like any other value.

pub(crate) mod handlers;

use rexpr_foundation::Value;

use crate::bytecode::registry::handler_for;
use crate::program::Program;

/// Per-evaluation mutable state.
///
/// Buffers are cleared, not freed, between evaluations so that steady-state
/// evaluation does not allocate for the stacks.
#[derive(Debug, Default)]
pub(crate) struct State {
    pub(crate) stack: Vec<Value>,
    pub(crate) let_values: Vec<Value>,
    pub(crate) pc: usize,
    pub(crate) if_count: usize,
}

impl State {
    /// Clear everything and make room for a program's stack depths.
    pub(crate) fn reset(&mut self, stack_depth: usize, let_depth: usize) {
        self.stack.clear();
        self.let_values.clear();
        self.pc = 0;
        self.if_count = 0;
        self.stack.reserve(stack_depth);
        self.let_values.reserve(let_depth);
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop the top value. An empty stack yields an error value.
    pub(crate) fn pop(&mut self) -> Value {
        debug_assert!(!self.stack.is_empty(), "operand stack underflow");
        self.stack.pop().unwrap_or(Value::Error)
    }

    /// Replace the top value with `f(top)`.
    pub(crate) fn map_top(&mut self, f: impl FnOnce(&Value) -> Value) {
        match self.stack.last_mut() {
            Some(top) => {
                let result = f(top);
                *top = result;
            }
            None => {
                debug_assert!(false, "operand stack underflow");
                self.stack.push(Value::Error);
            }
        }
    }

    pub(crate) fn jump(&mut self, offset: u32) {
        self.pc += offset as usize;
    }
}

/// Everything a handler may touch while one instruction executes.
pub(crate) struct Machine<'a> {
    pub(crate) program: &'a Program,
    pub(crate) params: &'a [Value],
    pub(crate) state: &'a mut State,
}

/// Run `program` to completion. `state` must already be reset.
pub(crate) fn run(program: &Program, params: &[Value], state: &mut State) {
    let instructions = program.instructions();
    let mut machine = Machine {
        program,
        params,
        state,
    };
    while machine.state.pc < instructions.len() {
        let instruction = &instructions[machine.state.pc];
        machine.state.pc += 1;
        handler_for(instruction.kind)(instruction.operand, &mut machine);
    }
}
