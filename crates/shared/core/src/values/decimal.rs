//! Conversions between human decimals and ledger integers

use alloy_primitives::U256;
use rust_decimal::Decimal;

use super::precise::{MathError, MathResult, checked_mul};

fn pow10(exp: u32) -> MathResult<U256> {
    let mut value = U256::from(1u64);
    for _ in 0..exp {
        value = checked_mul(value, U256::from(10u64))?;
    }
    Ok(value)
}

/// Scale a decimal amount to integer base units with `decimals` places.
/// Digits beyond `decimals` are truncated.
pub fn to_base_units(value: Decimal, decimals: u32) -> MathResult<U256> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(MathError::NegativeValue);
    }
    let mantissa = U256::from(value.mantissa().unsigned_abs());
    let scale = value.scale();
    if scale <= decimals {
        checked_mul(mantissa, pow10(decimals - scale)?)
    } else {
        Ok(mantissa / pow10(scale - decimals)?)
    }
}

/// Decimal percentage or ratio (e.g. `0.0025`) as an 18-decimal fixed point
pub fn precise_from_decimal(value: Decimal) -> MathResult<U256> {
    to_base_units(value, 18)
}

/// Integer base units back to a decimal for reporting.
/// Returns `None` when the value does not fit a `Decimal`.
pub fn from_base_units(value: U256, decimals: u32) -> Option<Decimal> {
    if value > U256::from(i128::MAX as u128) {
        return None;
    }
    let raw = i128::try_from(value.to::<u128>()).ok()?;
    Decimal::try_from_i128_with_scale(raw, decimals)
        .ok()
        .map(|d| d.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_base_units() {
        assert_eq!(
            to_base_units(dec!(86.9565217), 18).unwrap(),
            U256::from(86_956_521_700_000_000_000u128)
        );
        assert_eq!(
            to_base_units(dec!(0.01111111), 8).unwrap(),
            U256::from(1_111_111u64)
        );
        // Truncates beyond the token's precision
        assert_eq!(to_base_units(dec!(1.123), 2).unwrap(), U256::from(112u64));
    }

    #[test]
    fn test_precise_from_decimal_keeps_full_precision() {
        assert_eq!(
            precise_from_decimal(dec!(60.869565780223716593)).unwrap(),
            U256::from(60_869_565_780_223_716_593u128)
        );
        assert_eq!(
            precise_from_decimal(dec!(0.0025)).unwrap(),
            U256::from(2_500_000_000_000_000u64)
        );
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(to_base_units(dec!(-1), 18), Err(MathError::NegativeValue));
    }

    #[test]
    fn test_from_base_units() {
        assert_eq!(
            from_base_units(U256::from(1_111_111u64), 8),
            Some(dec!(0.01111111))
        );
        assert_eq!(from_base_units(U256::MAX, 18), None);
    }
}
