//! Position unit maintenance after custody balances change

use basket_core::values::precise::{checked_sub, precise_div, precise_mul};
use basket_core::{Address, U256};
use basket_ports::IndexLedger;

use crate::error::Result;

/// New real unit given balances before and after a trade.
///
/// Anything held beyond `pre_unit × supply` before the trade (an airdrop) is
/// excluded so it is not silently absorbed into the position.
pub(crate) fn default_edit_position_unit(
    total_supply: U256,
    pre_balance: U256,
    post_balance: U256,
    pre_unit: U256,
) -> Result<U256> {
    let airdropped = checked_sub(pre_balance, precise_mul(pre_unit, total_supply)?)?;
    Ok(precise_div(
        checked_sub(post_balance, airdropped)?,
        total_supply,
    )?)
}

/// Recompute and write `component`'s default position from custody.
/// Returns the post-trade custody balance.
pub(crate) fn calculate_and_edit_default_position<L: IndexLedger + ?Sized>(
    ledger: &mut L,
    token: Address,
    component: Address,
    total_supply: U256,
    pre_balance: U256,
) -> Result<U256> {
    let current_balance = ledger.balance_of(component, token);
    let pre_unit = ledger.default_position_real_unit(token, component)?;

    let new_unit = if current_balance.is_zero() {
        U256::ZERO
    } else {
        default_edit_position_unit(total_supply, pre_balance, current_balance, pre_unit)?
    };
    ledger.edit_default_position_unit(token, component, new_unit)?;
    Ok(current_balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RebalanceError;
    use basket_core::MathError;

    fn e18(v: u64) -> U256 {
        U256::from(v) * U256::from(1_000_000_000_000_000_000u64)
    }

    #[test]
    fn test_unit_follows_balance() {
        // 10 tokens, 5 per token, sold down to 30 held
        let unit = default_edit_position_unit(e18(10), e18(50), e18(30), e18(5)).unwrap();
        assert_eq!(unit, e18(3));
    }

    #[test]
    fn test_airdrop_is_excluded() {
        // 2 extra sit in custody on top of 10 × 5
        let unit = default_edit_position_unit(e18(10), e18(52), e18(62), e18(5)).unwrap();
        assert_eq!(unit, e18(6));
    }

    #[test]
    fn test_zero_supply_fails() {
        let err = default_edit_position_unit(U256::ZERO, e18(1), e18(1), e18(1)).unwrap_err();
        assert_eq!(err, RebalanceError::Math(MathError::DivisionByZero));
    }
}
