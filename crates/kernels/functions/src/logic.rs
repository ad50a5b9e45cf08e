//! Logic Operations
//!
//! Operands are truthy when non-zero; results are `1.0` / `0.0`. Both operands
//! of `and`/`or` are always evaluated: these are plain binary operations, not
//! control flow.

use rexpr_foundation::Value;

use crate::lift::{join, map, truth};

fn not(a: &Value) -> Value {
    map(a, |x| truth(x == 0.0))
}

fn and(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| truth(x != 0.0 && y != 0.0))
}

fn or(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| truth(x != 0.0 || y != 0.0))
}

unary_operation!(NOT, "not", "!x", "logic", "Logical negation", not);
binary_operation!(AND, "and", "a && b", "logic", "Logical conjunction", and);
binary_operation!(OR, "or", "a || b", "logic", "Logical disjunction", or);
