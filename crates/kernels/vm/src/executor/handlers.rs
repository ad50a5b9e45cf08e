//! Opcode handlers.
//!
//! A handler receives its instruction's operand and the machine. Operand
//! shapes were checked when the program was verified; a handler that still
//! sees the wrong shape pushes an error value instead of trusting it.

use rexpr_foundation::{TensorEngine, Value};

use super::Machine;
use crate::bytecode::operand::Operand;

/// Execution function for one opcode.
pub(crate) type Handler = fn(Operand, &mut Machine<'_>);

fn sum(a: f64, b: f64) -> f64 {
    a + b
}

/// Equality used by membership: numbers by value, tensors through the engine,
/// errors never.
fn member_equal(engine: &dyn TensorEngine, candidate: &Value, probe: &Value) -> bool {
    match (candidate, probe) {
        (Value::Tensor(a), Value::Tensor(b)) => engine.equal(a, b),
        _ => candidate.equal(probe),
    }
}

fn shape_mismatch(machine: &mut Machine<'_>, operand: Operand) {
    debug_assert!(false, "operand {operand:?} does not fit its opcode");
    machine.state.push(Value::Error);
}

pub(crate) fn handle_load_const(operand: Operand, machine: &mut Machine<'_>) {
    let Operand::Const(id) = operand else {
        return shape_mismatch(machine, operand);
    };
    let value = machine.program.constant(id).clone();
    machine.state.push(value);
}

pub(crate) fn handle_load_param(operand: Operand, machine: &mut Machine<'_>) {
    let Operand::Param(index) = operand else {
        return shape_mismatch(machine, operand);
    };
    let value = machine.params[index as usize].clone();
    machine.state.push(value);
}

pub(crate) fn handle_load_let(operand: Operand, machine: &mut Machine<'_>) {
    let Operand::Let(offset) = operand else {
        return shape_mismatch(machine, operand);
    };
    let values = &machine.state.let_values;
    let value = values
        .len()
        .checked_sub(1 + offset as usize)
        .map_or(Value::Error, |index| values[index].clone());
    machine.state.push(value);
}

pub(crate) fn handle_unary(operand: Operand, machine: &mut Machine<'_>) {
    let Operand::Unary(op) = operand else {
        return shape_mismatch(machine, operand);
    };
    machine.state.map_top(|a| (op.apply)(a));
}

pub(crate) fn handle_binary(operand: Operand, machine: &mut Machine<'_>) {
    let Operand::Binary(op) = operand else {
        return shape_mismatch(machine, operand);
    };
    let b = machine.state.pop();
    machine.state.map_top(|a| (op.apply)(a, &b));
}

pub(crate) fn handle_skip(operand: Operand, machine: &mut Machine<'_>) {
    let Operand::Offset(offset) = operand else {
        return shape_mismatch(machine, operand);
    };
    machine.state.jump(offset);
}

pub(crate) fn handle_skip_if_false(operand: Operand, machine: &mut Machine<'_>) {
    let Operand::Offset(offset) = operand else {
        return shape_mismatch(machine, operand);
    };
    machine.state.if_count += 1;
    if !machine.state.pop().as_bool() {
        machine.state.jump(offset);
    }
}

pub(crate) fn handle_store_let(_operand: Operand, machine: &mut Machine<'_>) {
    let value = machine.state.pop();
    machine.state.let_values.push(value);
}

pub(crate) fn handle_evict_let(_operand: Operand, machine: &mut Machine<'_>) {
    machine.state.let_values.pop();
}

pub(crate) fn handle_check_member(operand: Operand, machine: &mut Machine<'_>) {
    let Operand::Offset(offset) = operand else {
        return shape_mismatch(machine, operand);
    };
    let engine = machine.program.engine();
    let candidate = machine.state.pop();
    let found = machine
        .state
        .stack
        .last()
        .is_some_and(|probe| member_equal(engine, &candidate, probe));
    if found {
        machine.state.map_top(|_| Value::Double(1.0));
        machine.state.jump(offset);
    }
}

pub(crate) fn handle_not_member(_operand: Operand, machine: &mut Machine<'_>) {
    machine.state.map_top(|_| Value::Double(0.0));
}

pub(crate) fn handle_tensor_sum(_operand: Operand, machine: &mut Machine<'_>) {
    let engine = machine.program.engine();
    machine.state.map_top(|value| match value {
        Value::Tensor(tensor) => engine.reduce(tensor, sum, &[]),
        _ => Value::Error,
    });
}

pub(crate) fn handle_tensor_sum_dim(operand: Operand, machine: &mut Machine<'_>) {
    let Operand::Dimension(id) = operand else {
        return shape_mismatch(machine, operand);
    };
    let engine = machine.program.engine();
    let dimension = machine.program.dimension(id);
    machine.state.map_top(|value| match value {
        Value::Tensor(tensor) => engine.reduce(tensor, sum, &[dimension]),
        _ => Value::Error,
    });
}
