//! Math Functions
//!
//! The call-style functions: trigonometric, hyperbolic, exponential,
//! rounding, plus `atan2`, `isnan` and `relu`.

use rexpr_foundation::Value;

use crate::lift::{join, map, truth};

macro_rules! unary_math {
    ($($static:ident, $fn_name:ident, $name:literal, $doc:literal, $f:expr;)*) => {
        $(
            fn $fn_name(a: &Value) -> Value {
                map(a, $f)
            }
            unary_operation!(
                $static,
                $name,
                concat!($name, "(x)"),
                "math",
                $doc,
                $fn_name
            );
        )*
    };
}

unary_math! {
    COS, cos, "cos", "Cosine (radians)", f64::cos;
    SIN, sin, "sin", "Sine (radians)", f64::sin;
    TAN, tan, "tan", "Tangent (radians)", f64::tan;
    COSH, cosh, "cosh", "Hyperbolic cosine", f64::cosh;
    SINH, sinh, "sinh", "Hyperbolic sine", f64::sinh;
    TANH, tanh, "tanh", "Hyperbolic tangent", f64::tanh;
    ACOS, acos, "acos", "Arc cosine", f64::acos;
    ASIN, asin, "asin", "Arc sine", f64::asin;
    ATAN, atan, "atan", "Arc tangent", f64::atan;
    EXP, exp, "exp", "Natural exponential", f64::exp;
    LOG, log, "log", "Natural logarithm", f64::ln;
    LOG10, log10, "log10", "Base-10 logarithm", f64::log10;
    SQRT, sqrt, "sqrt", "Square root", f64::sqrt;
    CEIL, ceil, "ceil", "Round toward positive infinity", f64::ceil;
    FABS, fabs, "fabs", "Absolute value", f64::abs;
    FLOOR, floor, "floor", "Round toward negative infinity", f64::floor;
    ISNAN, isnan, "isnan", "`1.0` if the operand is NaN, else `0.0`", |x: f64| truth(x.is_nan());
    RELU, relu, "relu", "Rectified linear unit: `max(x, 0)`", |x: f64| x.max(0.0);
}

fn atan2(y: &Value, x: &Value) -> Value {
    join(y, x, f64::atan2)
}

binary_operation!(
    ATAN2,
    "atan2",
    "atan2(y, x)",
    "math",
    "Four-quadrant arc tangent of `y / x`",
    atan2
);
