//! Expression tree accepted by the compiler.
//!
//! The tree is a closed enum. How the compiler walks each kind is declared
//! once, by [`Node::traversal`]: post-order kinds have their children lowered
//! left to right before a single instruction for the node itself, custom kinds
//! control the order (and whether children are lowered at all) themselves.

use rexpr_functions::{arithmetic, compare, logic, math};
use rexpr_kernel_registry::OperationDescriptor;

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`
    Pow,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `~=`
    Approx,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl Operator {
    /// The catalog operation this operator lowers to.
    pub fn operation(self) -> &'static OperationDescriptor {
        match self {
            Operator::Add => &arithmetic::ADD,
            Operator::Sub => &arithmetic::SUB,
            Operator::Mul => &arithmetic::MUL,
            Operator::Div => &arithmetic::DIV,
            Operator::Pow => &arithmetic::POW,
            Operator::Equal => &compare::EQUAL,
            Operator::NotEqual => &compare::NOT_EQUAL,
            Operator::Approx => &compare::APPROX,
            Operator::Less => &compare::LESS,
            Operator::LessEqual => &compare::LESS_EQUAL,
            Operator::Greater => &compare::GREATER,
            Operator::GreaterEqual => &compare::GREATER_EQUAL,
            Operator::And => &logic::AND,
            Operator::Or => &logic::OR,
        }
    }
}

/// Call-style functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Cos,
    Sin,
    Tan,
    Cosh,
    Sinh,
    Tanh,
    Acos,
    Asin,
    Atan,
    Exp,
    Log,
    Log10,
    Sqrt,
    Ceil,
    Fabs,
    Floor,
    Atan2,
    Ldexp,
    /// Same operation as [`Operator::Pow`].
    Pow,
    Fmod,
    Min,
    Max,
    IsNan,
    Relu,
}

impl Function {
    /// The catalog operation this function lowers to.
    pub fn operation(self) -> &'static OperationDescriptor {
        match self {
            Function::Cos => &math::COS,
            Function::Sin => &math::SIN,
            Function::Tan => &math::TAN,
            Function::Cosh => &math::COSH,
            Function::Sinh => &math::SINH,
            Function::Tanh => &math::TANH,
            Function::Acos => &math::ACOS,
            Function::Asin => &math::ASIN,
            Function::Atan => &math::ATAN,
            Function::Exp => &math::EXP,
            Function::Log => &math::LOG,
            Function::Log10 => &math::LOG10,
            Function::Sqrt => &math::SQRT,
            Function::Ceil => &math::CEIL,
            Function::Fabs => &math::FABS,
            Function::Floor => &math::FLOOR,
            Function::Atan2 => &math::ATAN2,
            Function::Ldexp => &arithmetic::LDEXP,
            Function::Pow => &arithmetic::POW,
            Function::Fmod => &arithmetic::FMOD,
            Function::Min => &arithmetic::MIN,
            Function::Max => &arithmetic::MAX,
            Function::IsNan => &math::ISNAN,
            Function::Relu => &math::RELU,
        }
    }

    /// Number of arguments the function takes.
    pub fn arity(self) -> usize {
        self.operation().arity()
    }
}

/// One explicit cell of a tensor literal.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorCell {
    /// `(dimension, label)` pairs. Dimensions not mentioned get the empty label.
    pub address: Vec<(String, String)>,
    /// Cell value.
    pub value: f64,
}

impl TensorCell {
    /// Build a cell from borrowed address parts.
    pub fn new<'a>(address: impl IntoIterator<Item = (&'a str, &'a str)>, value: f64) -> Self {
        Self {
            address: address
                .into_iter()
                .map(|(d, l)| (d.to_string(), l.to_string()))
                .collect(),
            value,
        }
    }
}

/// How the compiler descends into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Lower every child left to right, then emit one instruction for the node.
    PostOrder,
    /// The node's lowering rule decides what to lower and in which order.
    Custom,
}

/// Expression tree node.
#[derive(Debug, Clone)]
pub enum Node {
    /// Numeric literal.
    Number(f64),
    /// Symbol reference: `id >= 0` is parameter `id`, `id < 0` is the let
    /// binding `-(id + 1)` levels out from the innermost one.
    Symbol(i32),
    /// String literal, evaluated as its stable hash.
    String(String),
    /// Array literal. Outside a membership test it evaluates to its length.
    Array(Vec<Node>),
    /// Literal error value.
    Error,
    /// Tensor literal.
    Tensor(Vec<TensorCell>),
    /// `-x`
    Neg(Box<Node>),
    /// `!x`
    Not(Box<Node>),
    /// Infix binary operator.
    Operator {
        op: Operator,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    /// Call-style function.
    Call { function: Function, args: Vec<Node> },
    /// Any catalog operation applied to its arguments.
    Apply {
        operation: &'static OperationDescriptor,
        args: Vec<Node>,
    },
    /// `if (cond, true_expr, false_expr)`
    If {
        cond: Box<Node>,
        true_expr: Box<Node>,
        false_expr: Box<Node>,
    },
    /// `let (name, value, expr)`; `expr` sees the binding as symbol `-1`.
    Let {
        name: String,
        value: Box<Node>,
        expr: Box<Node>,
    },
    /// `lhs in rhs`; `rhs` is an array of candidates or a single candidate.
    In { lhs: Box<Node>, rhs: Box<Node> },
    /// Sum over all dimensions, or over one named dimension.
    TensorSum {
        child: Box<Node>,
        dimension: Option<String>,
    },
    /// Cell-wise product of two tensors.
    TensorMatch { lhs: Box<Node>, rhs: Box<Node> },
}

impl Node {
    /// Parameter reference.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not fit a non-negative symbol id. Use
    /// [`Node::try_param`] for untrusted indices.
    pub fn param(index: u32) -> Self {
        match Self::try_param(index) {
            Some(node) => node,
            None => panic!("parameter index {index} exceeds the symbol range"),
        }
    }

    /// Let reference, `0` being the innermost binding.
    ///
    /// # Panics
    ///
    /// Panics if `offset` does not fit a negative symbol id. Use
    /// [`Node::try_let_ref`] for untrusted offsets.
    pub fn let_ref(offset: u32) -> Self {
        match Self::try_let_ref(offset) {
            Some(node) => node,
            None => panic!("let offset {offset} exceeds the symbol range"),
        }
    }

    /// Parameter reference, or `None` if `index` exceeds `i32::MAX`.
    pub fn try_param(index: u32) -> Option<Self> {
        i32::try_from(index).ok().map(Node::Symbol)
    }

    /// Let reference, or `None` if `offset` exceeds `i32::MAX`.
    pub fn try_let_ref(offset: u32) -> Option<Self> {
        i32::try_from(offset).ok().map(|offset| Node::Symbol(-offset - 1))
    }

    pub fn neg(child: Node) -> Self {
        Node::Neg(Box::new(child))
    }

    pub fn not(child: Node) -> Self {
        Node::Not(Box::new(child))
    }

    pub fn op(op: Operator, lhs: Node, rhs: Node) -> Self {
        Node::Operator {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(function: Function, args: Vec<Node>) -> Self {
        Node::Call { function, args }
    }

    pub fn apply(operation: &'static OperationDescriptor, args: Vec<Node>) -> Self {
        Node::Apply { operation, args }
    }

    pub fn if_else(cond: Node, true_expr: Node, false_expr: Node) -> Self {
        Node::If {
            cond: Box::new(cond),
            true_expr: Box::new(true_expr),
            false_expr: Box::new(false_expr),
        }
    }

    pub fn let_in(name: impl Into<String>, value: Node, expr: Node) -> Self {
        Node::Let {
            name: name.into(),
            value: Box::new(value),
            expr: Box::new(expr),
        }
    }

    pub fn member(lhs: Node, rhs: Node) -> Self {
        Node::In {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn sum(child: Node) -> Self {
        Node::TensorSum {
            child: Box::new(child),
            dimension: None,
        }
    }

    pub fn sum_over(child: Node, dimension: impl Into<String>) -> Self {
        Node::TensorSum {
            child: Box::new(child),
            dimension: Some(dimension.into()),
        }
    }

    pub fn tensor_match(lhs: Node, rhs: Node) -> Self {
        Node::TensorMatch {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Traversal order for this node kind.
    pub fn traversal(&self) -> Traversal {
        match self {
            Node::Array(_) | Node::If { .. } | Node::Let { .. } | Node::In { .. } => {
                Traversal::Custom
            }
            Node::Number(_)
            | Node::Symbol(_)
            | Node::String(_)
            | Node::Error
            | Node::Tensor(_)
            | Node::Neg(_)
            | Node::Not(_)
            | Node::Operator { .. }
            | Node::Call { .. }
            | Node::Apply { .. }
            | Node::TensorSum { .. }
            | Node::TensorMatch { .. } => Traversal::PostOrder,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Number(_) | Node::Symbol(_) | Node::String(_) | Node::Error | Node::Tensor(_) => {
                Vec::new()
            }
            Node::Array(items) => items.iter().collect(),
            Node::Neg(child) | Node::Not(child) | Node::TensorSum { child, .. } => vec![&**child],
            Node::Operator { lhs, rhs, .. }
            | Node::In { lhs, rhs }
            | Node::TensorMatch { lhs, rhs } => vec![&**lhs, &**rhs],
            Node::Call { args, .. } | Node::Apply { args, .. } => args.iter().collect(),
            Node::If {
                cond,
                true_expr,
                false_expr,
            } => vec![&**cond, &**true_expr, &**false_expr],
            Node::Let { value, expr, .. } => vec![&**value, &**expr],
        }
    }

    /// Short name of the node kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Number(_) => "number",
            Node::Symbol(_) => "symbol",
            Node::String(_) => "string",
            Node::Array(_) => "array",
            Node::Error => "error",
            Node::Tensor(_) => "tensor",
            Node::Neg(_) => "neg",
            Node::Not(_) => "not",
            Node::Operator { .. } => "operator",
            Node::Call { .. } => "call",
            Node::Apply { .. } => "apply",
            Node::If { .. } => "if",
            Node::Let { .. } => "let",
            Node::In { .. } => "in",
            Node::TensorSum { .. } => "tensor_sum",
            Node::TensorMatch { .. } => "tensor_match",
        }
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_helpers() {
        assert!(matches!(Node::param(3), Node::Symbol(3)));
        assert!(matches!(Node::let_ref(0), Node::Symbol(-1)));
        assert!(matches!(Node::let_ref(2), Node::Symbol(-3)));
    }

    #[test]
    fn test_symbol_range_edges() {
        let max = i32::MAX as u32;
        assert!(matches!(Node::try_param(max), Some(Node::Symbol(i32::MAX))));
        assert!(Node::try_param(max + 1).is_none());
        assert!(Node::try_param(u32::MAX).is_none());

        assert!(matches!(Node::try_let_ref(max), Some(Node::Symbol(i32::MIN))));
        assert!(Node::try_let_ref(max + 1).is_none());
        assert!(Node::try_let_ref(u32::MAX).is_none());
    }

    #[test]
    #[should_panic(expected = "exceeds the symbol range")]
    fn test_param_beyond_symbol_range_panics() {
        Node::param(u32::MAX);
    }

    #[test]
    #[should_panic(expected = "exceeds the symbol range")]
    fn test_let_ref_beyond_symbol_range_panics() {
        Node::let_ref(1 << 31);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Node::param(0).kind_name(), "symbol");
        assert_eq!(Node::sum(Node::Error).kind_name(), "tensor_sum");
        assert_eq!(Node::member(1.0.into(), 2.0.into()).kind_name(), "in");
    }

    #[test]
    fn test_traversal_table() {
        assert_eq!(Node::Array(vec![]).traversal(), Traversal::Custom);
        assert_eq!(
            Node::if_else(1.0.into(), 2.0.into(), 3.0.into()).traversal(),
            Traversal::Custom
        );
        assert_eq!(
            Node::op(Operator::Add, 1.0.into(), 2.0.into()).traversal(),
            Traversal::PostOrder
        );
        assert_eq!(Node::sum(Node::Error).traversal(), Traversal::PostOrder);
    }

    #[test]
    fn test_children_order() {
        let node = Node::op(Operator::Sub, Node::Number(1.0), Node::Number(2.0));
        let children = node.children();
        assert!(matches!(children[0], Node::Number(v) if *v == 1.0));
        assert!(matches!(children[1], Node::Number(v) if *v == 2.0));
    }

    #[test]
    fn test_call_style_pow_shares_operator() {
        assert!(std::ptr::eq(Function::Pow.operation(), Operator::Pow.operation()));
        assert_eq!(Function::Atan2.arity(), 2);
        assert_eq!(Function::Sqrt.arity(), 1);
    }
}
