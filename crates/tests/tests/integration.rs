//! Integration tests for end-to-end rexpr evaluation.
//!
//! These tests verify the full pipeline:
//! Build tree → Compile → Evaluate → Verify

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rexpr_kernel_registry::{OperationDescriptor, OperationImpl};
use rexpr_tests::TestHarness;
use rexpr_vm::{CompileError, Node, Operator, Program, TensorCell, Value, VmConfig};

fn num(v: f64) -> Node {
    Node::Number(v)
}

fn x() -> Node {
    Node::param(0)
}

/// `2 + 3 * 4`
#[test]
fn test_scenario_arithmetic_precedence() {
    let tree = Node::op(
        Operator::Add,
        num(2.0),
        Node::op(Operator::Mul, num(3.0), num(4.0)),
    );
    let mut harness = TestHarness::from_tree(&tree, 0);
    assert_eq!(harness.eval(&[]), Value::Double(14.0));
}

/// `if (x > 0, x, -x)`
#[test]
fn test_scenario_absolute_value() {
    let tree = Node::if_else(
        Node::op(Operator::Greater, x(), num(0.0)),
        x(),
        Node::neg(x()),
    );
    let mut harness = TestHarness::from_tree(&tree, 1);
    assert_eq!(harness.eval(&[-5.0]), Value::Double(5.0));
    assert_eq!(harness.eval(&[5.0]), Value::Double(5.0));
}

/// `let y = x * x in y + 1`
#[test]
fn test_scenario_let_binding() {
    let tree = Node::let_in(
        "y",
        Node::op(Operator::Mul, x(), x()),
        Node::op(Operator::Add, Node::let_ref(0), num(1.0)),
    );
    let mut harness = TestHarness::from_tree(&tree, 1);
    assert_eq!(harness.eval(&[3.0]), Value::Double(10.0));
}

/// `x in {1, 2, 3}`
#[test]
fn test_scenario_membership() {
    let tree = Node::member(x(), Node::Array(vec![num(1.0), num(2.0), num(3.0)]));
    let mut harness = TestHarness::from_tree(&tree, 1);
    assert_eq!(harness.eval(&[2.0]), Value::Double(1.0));
    assert_eq!(harness.eval(&[9.0]), Value::Double(0.0));
}

/// Sum a two-dimensional literal over one dimension, then over the other.
#[test]
fn test_scenario_tensor_sum_over_dimension() {
    let matrix = Node::Tensor(vec![
        TensorCell::new([("x", "a"), ("y", "a")], 1.0),
        TensorCell::new([("x", "a"), ("y", "b")], 2.0),
        TensorCell::new([("x", "b"), ("y", "a")], 3.0),
        TensorCell::new([("x", "b"), ("y", "b")], 4.0),
    ]);

    let mut harness = TestHarness::from_tree(&Node::sum_over(matrix.clone(), "x"), 0);
    let by_y = harness.eval(&[]);
    let tensor = by_y.as_tensor().expect("one dimension left");
    assert_eq!(tensor.dimensions(), ["y".to_string()]);
    assert_eq!(tensor.get(&[("y", "a")]), Some(4.0));
    assert_eq!(tensor.get(&[("y", "b")]), Some(6.0));

    let tree = Node::sum_over(Node::sum_over(matrix, "x"), "y");
    let mut harness = TestHarness::from_tree(&tree, 0);
    assert_eq!(harness.eval(&[]), Value::Double(10.0));
}

#[test]
fn test_tensor_sum_of_two_cells() {
    let tensor = Node::Tensor(vec![
        TensorCell::new([("d", "a")], 2.0),
        TensorCell::new([("d", "b")], 3.0),
    ]);
    let mut harness = TestHarness::from_tree(&Node::sum(tensor.clone()), 0);
    assert_eq!(harness.eval(&[]), Value::Double(5.0));

    let mut harness = TestHarness::from_tree(&Node::sum_over(tensor, "missing"), 0);
    assert_eq!(harness.eval(&[]), Value::Error);

    let mut harness = TestHarness::from_tree(&Node::sum(x()), 1);
    assert_eq!(harness.eval(&[5.0]), Value::Error);
}

#[test]
fn test_tensor_arithmetic_with_scalars() {
    let tensor = Node::Tensor(vec![
        TensorCell::new([("d", "a")], 2.0),
        TensorCell::new([("d", "b")], 3.0),
    ]);
    // sum(t * x) == x * sum(t)
    let tree = Node::sum(Node::op(Operator::Mul, tensor, x()));
    let mut harness = TestHarness::from_tree(&tree, 1);
    assert_eq!(harness.eval_scalar(&[4.0]), 20.0);
}

#[test]
fn test_dimensionless_tensor_literal() {
    let tree = Node::sum(Node::Tensor(vec![
        TensorCell::new(Vec::new(), 1.5),
        TensorCell::new(Vec::new(), 2.5),
    ]));
    let mut harness = TestHarness::from_tree(&tree, 0);
    assert_eq!(harness.eval(&[]), Value::Double(4.0));
}

static SKIPPED_BRANCH_CALLS: AtomicUsize = AtomicUsize::new(0);

fn count_skipped_branch(v: &Value) -> Value {
    SKIPPED_BRANCH_CALLS.fetch_add(1, Ordering::SeqCst);
    v.clone()
}

static SKIPPED_BRANCH_PROBE: OperationDescriptor = OperationDescriptor {
    name: "skipped_branch_probe",
    signature: "skipped_branch_probe(x)",
    doc: "Counts how often a conditional branch runs",
    category: "test",
    implementation: OperationImpl::Unary(count_skipped_branch),
};

#[test]
fn test_conditional_runs_exactly_one_branch() {
    let probe = |v| Node::apply(&SKIPPED_BRANCH_PROBE, vec![num(v)]);

    // the probe wraps the false branch only
    let tree = Node::if_else(x(), num(1.0), probe(2.0));
    let mut harness = TestHarness::from_tree(&tree, 1);
    let before = SKIPPED_BRANCH_CALLS.load(Ordering::SeqCst);
    assert_eq!(harness.eval(&[1.0]), Value::Double(1.0));
    assert_eq!(SKIPPED_BRANCH_CALLS.load(Ordering::SeqCst), before);
    assert_eq!(harness.if_count(), 1);

    // symmetric: the probe wraps the true branch only
    let tree = Node::if_else(x(), probe(1.0), num(2.0));
    let mut harness = TestHarness::from_tree(&tree, 1);
    let before = SKIPPED_BRANCH_CALLS.load(Ordering::SeqCst);
    assert_eq!(harness.eval(&[0.0]), Value::Double(2.0));
    assert_eq!(SKIPPED_BRANCH_CALLS.load(Ordering::SeqCst), before);
}

/// `let a = 1 in (let a = 2 in a) + a` evaluates the inner `a` to 2 and the
/// outer one, after the inner scope ends, to 1.
#[test]
fn test_let_shadowing() {
    let tree = Node::let_in(
        "a",
        num(1.0),
        Node::op(
            Operator::Add,
            Node::op(
                Operator::Mul,
                Node::let_in("a", num(2.0), Node::let_ref(0)),
                num(100.0),
            ),
            Node::let_ref(0),
        ),
    );
    let mut harness = TestHarness::from_tree(&tree, 0);
    assert_eq!(harness.eval(&[]), Value::Double(201.0));
}

static CANDIDATE_CALLS: AtomicUsize = AtomicUsize::new(0);

fn count_candidate(v: &Value) -> Value {
    CANDIDATE_CALLS.fetch_add(1, Ordering::SeqCst);
    v.clone()
}

static CANDIDATE_PROBE: OperationDescriptor = OperationDescriptor {
    name: "candidate_probe",
    signature: "candidate_probe(x)",
    doc: "Counts how often a membership candidate is evaluated",
    category: "test",
    implementation: OperationImpl::Unary(count_candidate),
};

#[test]
fn test_membership_short_circuits() {
    let candidate = |v| Node::apply(&CANDIDATE_PROBE, vec![num(v)]);
    let tree = Node::member(
        x(),
        Node::Array(vec![candidate(1.0), candidate(2.0), candidate(3.0)]),
    );
    let mut harness = TestHarness::from_tree(&tree, 1);

    let before = CANDIDATE_CALLS.load(Ordering::SeqCst);
    assert_eq!(harness.eval(&[1.0]), Value::Double(1.0));
    assert_eq!(CANDIDATE_CALLS.load(Ordering::SeqCst) - before, 1);

    let before = CANDIDATE_CALLS.load(Ordering::SeqCst);
    assert_eq!(harness.eval(&[2.0]), Value::Double(1.0));
    assert_eq!(CANDIDATE_CALLS.load(Ordering::SeqCst) - before, 2);

    let before = CANDIDATE_CALLS.load(Ordering::SeqCst);
    assert_eq!(harness.eval(&[7.0]), Value::Double(0.0));
    assert_eq!(CANDIDATE_CALLS.load(Ordering::SeqCst) - before, 3);
}

#[test]
fn test_membership_inside_arithmetic() {
    // 10 + (x in [1, 2]) * 5
    let tree = Node::op(
        Operator::Add,
        num(10.0),
        Node::op(
            Operator::Mul,
            Node::member(x(), Node::Array(vec![num(1.0), num(2.0)])),
            num(5.0),
        ),
    );
    let mut harness = TestHarness::from_tree(&tree, 1);
    assert_eq!(harness.eval(&[2.0]), Value::Double(15.0));
    assert_eq!(harness.eval(&[3.0]), Value::Double(10.0));
}

#[test]
fn test_unary_and_binary_stack_effects() {
    // a unary operation never deepens the stack; a binary one needs two slots
    let unary = TestHarness::from_tree(&Node::neg(Node::neg(x())), 1);
    assert_eq!(unary.program().max_stack_depth(), 1);
    let binary = TestHarness::from_tree(&Node::op(Operator::Add, x(), x()), 1);
    assert_eq!(binary.program().max_stack_depth(), 2);
}

#[test]
fn test_repeated_evaluation_is_idempotent() {
    let tree = Node::let_in(
        "y",
        Node::op(Operator::Mul, x(), x()),
        Node::if_else(
            Node::member(Node::let_ref(0), Node::Array(vec![num(4.0), num(9.0)])),
            Node::let_ref(0),
            Node::neg(Node::let_ref(0)),
        ),
    );
    let mut harness = TestHarness::from_tree(&tree, 1);
    let first = harness.eval(&[3.0]);
    let second = harness.eval(&[3.0]);
    assert_eq!(first, Value::Double(9.0));
    assert_eq!(first, second);
    assert_eq!(harness.eval(&[5.0]), Value::Double(-25.0));
}

#[test]
fn test_concurrent_contexts_are_independent() {
    rexpr_tests::init_logging();
    // let y = x * x in if (y > 50, y - x, y + x)
    let tree = Node::let_in(
        "y",
        Node::op(Operator::Mul, x(), x()),
        Node::if_else(
            Node::op(Operator::Greater, Node::let_ref(0), num(50.0)),
            Node::op(Operator::Sub, Node::let_ref(0), x()),
            Node::op(Operator::Add, Node::let_ref(0), x()),
        ),
    );
    let program = Program::compile(&tree, 1).unwrap();
    let expected = |v: f64| {
        let y = v * v;
        if y > 50.0 {
            y - v
        } else {
            y + v
        }
    };

    let results: Vec<(f64, f64)> = (0..1_000)
        .into_par_iter()
        .map(|i| {
            let v = (i % 17) as f64;
            let mut ctx = program.context();
            ctx.bind(0, v);
            let mut last = 0.0;
            for _ in 0..10 {
                last = program.eval(&mut ctx).as_double();
            }
            (v, last)
        })
        .collect();

    for (v, result) in results {
        assert_eq!(result, expected(v), "x = {v}");
    }
}

#[test]
fn test_compile_errors_surface() {
    let err = Program::compile(&x(), 0).unwrap_err();
    assert!(matches!(err, CompileError::ParamOutOfRange { id: 0, .. }));

    let err = Program::compile(&Node::let_ref(0), 0).unwrap_err();
    assert!(matches!(err, CompileError::UnboundLet { .. }));
}

#[test]
fn test_config_from_file_limits_nesting() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_nesting_depth: 4").unwrap();
    let config = VmConfig::load(file.path()).unwrap();

    let mut deep = x();
    for _ in 0..4 {
        deep = Node::neg(deep);
    }
    let err = Program::compile_with_config(&deep, 1, &config).unwrap_err();
    assert_eq!(
        err,
        CompileError::NestingTooDeep {
            limit: 4,
            kind: "symbol"
        }
    );

    let shallow = Node::neg(Node::neg(x()));
    let mut harness = TestHarness::with_config(&shallow, 1, &config);
    assert_eq!(harness.eval(&[3.0]), Value::Double(3.0));
}

#[test]
fn test_string_parameters_compare_by_hash() {
    // a caller binds string parameters through the same hash the compiler uses
    let tree = Node::member(
        x(),
        Node::Array(vec![Node::String("red".into()), Node::String("blue".into())]),
    );
    let mut harness = TestHarness::from_tree(&tree, 1);
    let blue = rexpr_foundation::hash_string("blue");
    let green = rexpr_foundation::hash_string("green");
    assert_eq!(harness.eval(&[blue]), Value::Double(1.0));
    assert_eq!(harness.eval(&[green]), Value::Double(0.0));
}
