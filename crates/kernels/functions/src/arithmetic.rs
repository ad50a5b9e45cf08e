//! Arithmetic Operations
//!
//! The infix arithmetic operators plus the two-argument numeric helpers
//! (`fmod`, `ldexp`, `min`, `max`).

use rexpr_foundation::Value;

use crate::lift::{join, map};

fn neg(a: &Value) -> Value {
    map(a, |x| -x)
}

fn add(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| x + y)
}

fn sub(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| x - y)
}

fn mul(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| x * y)
}

fn div(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| x / y)
}

fn pow(a: &Value, b: &Value) -> Value {
    join(a, b, f64::powf)
}

fn fmod(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| x % y)
}

/// `x * 2^y` with the exponent truncated to an integer.
fn ldexp(a: &Value, b: &Value) -> Value {
    join(a, b, |x, y| scalbn(x, y as i32))
}

/// `x * 2^n` without overflowing or underflowing in an intermediate power.
///
/// Large exponents are applied in steps that stay inside the normal range,
/// so only the final multiply can round.
fn scalbn(x: f64, mut n: i32) -> f64 {
    let two_1023 = f64::from_bits(0x7fe0_0000_0000_0000);
    // 2^-1022 * 2^53, keeps the intermediate normal
    let two_minus_969 = f64::from_bits(0x0360_0000_0000_0000);

    let mut y = x;
    if n > 1023 {
        y *= two_1023;
        n -= 1023;
        if n > 1023 {
            y *= two_1023;
            n = (n - 1023).min(1023);
        }
    } else if n < -1022 {
        y *= two_minus_969;
        n += 969;
        if n < -1022 {
            y *= two_minus_969;
            n = (n + 969).max(-1022);
        }
    }
    y * f64::from_bits(((0x3ff + n) as u64) << 52)
}

fn min(a: &Value, b: &Value) -> Value {
    join(a, b, f64::min)
}

fn max(a: &Value, b: &Value) -> Value {
    join(a, b, f64::max)
}

unary_operation!(NEG, "neg", "-x", "arithmetic", "Negation: `-x`", neg);
binary_operation!(ADD, "add", "a + b", "arithmetic", "Addition: `a + b`", add);
binary_operation!(SUB, "sub", "a - b", "arithmetic", "Subtraction: `a - b`", sub);
binary_operation!(MUL, "mul", "a * b", "arithmetic", "Multiplication: `a * b`", mul);
binary_operation!(DIV, "div", "a / b", "arithmetic", "Division: `a / b`", div);
binary_operation!(
    POW,
    "pow",
    "pow(base, exp)",
    "arithmetic",
    "Power: `base ^ exp`",
    pow
);
binary_operation!(
    FMOD,
    "fmod",
    "fmod(a, b)",
    "arithmetic",
    "Floating-point remainder with the sign of `a`",
    fmod
);
binary_operation!(
    LDEXP,
    "ldexp",
    "ldexp(x, exp)",
    "arithmetic",
    "`x * 2^exp`, exponent truncated to an integer",
    ldexp
);
binary_operation!(MIN, "min", "min(a, b)", "arithmetic", "Smaller of two values", min);
binary_operation!(MAX, "max", "max(a, b)", "arithmetic", "Larger of two values", max);
