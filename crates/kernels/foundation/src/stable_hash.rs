//! Stable string hashing for string literals.
//!
//! String literals are evaluated as numbers: the evaluator replaces each one
//! with the hash of its bytes. Callers that bind string-valued parameters use
//! [`hash_string`] so that `param == "literal"` compares equal.
//!
//! NOTE: FNV-1a is **not** cryptographically secure.

/// 64-bit FNV-1a offset basis.
pub const FNV1A_OFFSET_BASIS_64: u64 = 0xcbf29ce484222325;
/// 64-bit FNV-1a prime.
pub const FNV1A_PRIME_64: u64 = 0x0000_0100_0000_01B3;

/// Hash a byte slice with FNV-1a 64-bit.
#[inline]
pub const fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV1A_OFFSET_BASIS_64;
    let mut i = 0usize;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV1A_PRIME_64);
        i += 1;
    }
    hash
}

/// Hash a UTF-8 string with FNV-1a 64-bit.
#[inline]
pub const fn fnv1a64_str(s: &str) -> u64 {
    fnv1a64(s.as_bytes())
}

/// Numeric value a string literal evaluates to.
///
/// The conversion to `f64` is lossy for large hashes but deterministic, which
/// is all equality tests between literals and bound parameters need.
#[inline]
pub fn hash_string(s: &str) -> f64 {
    fnv1a64_str(s) as f64
}
