//! 18-decimal fixed point arithmetic over `U256`
//!
//! Every ratio on the ledger (position units, multipliers, fee and raise
//! percentages) is an integer scaled by [`PRECISE_UNIT`]. All operations are
//! checked; rounding direction is explicit in the function name.

use alloy_primitives::U256;
use thiserror::Error;

/// 10^18, the fixed point "one"
pub const PRECISE_UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Arithmetic failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Arithmetic underflow")]
    Underflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Negative value cannot be represented")]
    NegativeValue,
}

pub type MathResult<T> = std::result::Result<T, MathError>;

fn one() -> U256 {
    U256::from(1u64)
}

pub fn checked_add(a: U256, b: U256) -> MathResult<U256> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

pub fn checked_sub(a: U256, b: U256) -> MathResult<U256> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

pub fn checked_mul(a: U256, b: U256) -> MathResult<U256> {
    a.checked_mul(b).ok_or(MathError::Overflow)
}

/// `a * b / c`, rounded down
pub fn mul_div(a: U256, b: U256, c: U256) -> MathResult<U256> {
    if c.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok(checked_mul(a, b)? / c)
}

/// `a * b / 10^18`, rounded down
pub fn precise_mul(a: U256, b: U256) -> MathResult<U256> {
    Ok(checked_mul(a, b)? / PRECISE_UNIT)
}

/// `a * b / 10^18`, rounded up
pub fn precise_mul_ceil(a: U256, b: U256) -> MathResult<U256> {
    if a.is_zero() || b.is_zero() {
        return Ok(U256::ZERO);
    }
    Ok((checked_mul(a, b)? - one()) / PRECISE_UNIT + one())
}

/// `a * 10^18 / b`, rounded down
pub fn precise_div(a: U256, b: U256) -> MathResult<U256> {
    mul_div(a, PRECISE_UNIT, b)
}

/// `a * 10^18 / b`, rounded up
pub fn precise_div_ceil(a: U256, b: U256) -> MathResult<U256> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    if a.is_zero() {
        return Ok(U256::ZERO);
    }
    Ok((checked_mul(a, PRECISE_UNIT)? - one()) / b + one())
}

/// True when `a` is within `range` of `b` (inclusive)
pub fn approximately_equals(a: U256, b: U256, range: U256) -> bool {
    a <= b.saturating_add(range) && a >= b.saturating_sub(range)
}
