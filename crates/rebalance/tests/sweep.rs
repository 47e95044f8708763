//! Deploying leftover reserve with `trade_remaining_weth`

mod common;

use basket_core::U256;
use basket_ports::IndexLedger;
use basket_rebalance::{RebalanceError, Result, TradeReceipt};
use common::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// DAI 100 and WETH 0.01 per token, 10 tokens, targets DAI `dai_target`
/// and WETH `weth_target`
fn fixture(dai_target: Decimal, weth_target: Decimal) -> Fixture {
    let mut fx = Fixture::new(
        &[(dai(), e18(dec!(100))), (weth(), e18(dec!(0.01)))],
        e18(dec!(10)),
    );
    fx.start_rebalance(&[], &[], &[e18(dai_target), e18(weth_target)]);
    fx
}

fn sweep(fx: &mut Fixture, min_received: U256) -> Result<TradeReceipt> {
    fx.module
        .trade_remaining_weth(&mut fx.ledger, as_trader(), token(), dai(), min_received)
}

#[test]
fn test_sweep_deploys_entire_excess() {
    let mut fx = fixture(dec!(130), dec!(0));

    let receipt = sweep(&mut fx, e18(dec!(150))).unwrap();

    assert_eq!(receipt.sell_component, weth());
    assert_eq!(receipt.buy_component, dai());
    assert_eq!(receipt.net_amount_sold, e18(dec!(0.1)));
    assert_eq!(receipt.net_amount_received, e18(dec!(200)));
    assert_eq!(fx.unit(dai()), e18(dec!(120)));
    assert_eq!(fx.custody(weth()), U256::ZERO);
    assert_eq!(fx.ledger.components(token()).unwrap(), vec![dai()]);
}

#[test]
fn test_sweep_keeps_reserve_target() {
    let mut fx = fixture(dec!(130), dec!(0.004));

    let receipt = sweep(&mut fx, U256::ZERO).unwrap();

    // Only the 0.06 above 10 × 0.004 leaves custody
    assert_eq!(receipt.net_amount_sold, e18(dec!(0.06)));
    assert_eq!(fx.unit(weth()), e18(dec!(0.004)));
    assert_eq!(fx.unit(dai()), e18(dec!(112)));
}

#[test]
fn test_sweep_cannot_overshoot_target() {
    let mut fx = fixture(dec!(110), dec!(0));
    let err = sweep(&mut fx, U256::ZERO).unwrap_err();
    assert_eq!(err.to_string(), "Can not exceed target unit");
}

#[test]
fn test_sweep_clamped_to_max_size() {
    let mut fx = fixture(dec!(130), dec!(0));
    fx.set_max_size(dai(), e18(dec!(150)));

    // The 0.1 WETH excess would buy 200 DAI; only 150 are bought
    let receipt = sweep(&mut fx, U256::ZERO).unwrap();

    assert_eq!(receipt.net_amount_received, e18(dec!(150)));
    assert_eq!(receipt.net_amount_sold, e18(dec!(0.075)));
    assert_eq!(fx.unit(dai()), e18(dec!(115)));
    assert_eq!(fx.unit(weth()), e18(dec!(0.0025)));
    assert_eq!(fx.custody(weth()), e18(dec!(0.025)));
}

#[test]
fn test_sweep_at_exactly_max_size_is_not_clamped() {
    let mut fx = fixture(dec!(130), dec!(0));
    fx.set_max_size(dai(), e18(dec!(200)));

    let receipt = sweep(&mut fx, U256::ZERO).unwrap();
    assert_eq!(receipt.net_amount_sold, e18(dec!(0.1)));
    assert_eq!(fx.unit(dai()), e18(dec!(120)));
}

#[test]
fn test_sweep_clamp_honours_minimum_received() {
    let mut fx = fixture(dec!(130), dec!(0));
    fx.set_max_size(dai(), e18(dec!(150)));

    let err = sweep(&mut fx, e18(dec!(160))).unwrap_err();
    assert_eq!(err, RebalanceError::SlippageExceeded);
    assert_eq!(fx.unit(dai()), e18(dec!(100)));
}

#[test]
fn test_sweep_clamped_trade_still_cannot_overshoot() {
    let mut fx = fixture(dec!(110), dec!(0));
    fx.set_max_size(dai(), e18(dec!(150)));

    let err = sweep(&mut fx, U256::ZERO).unwrap_err();
    assert_eq!(err, RebalanceError::ExceedsTargetUnit);
}

#[test]
fn test_sweep_without_max_size_rejected() {
    let mut fx = fixture(dec!(130), dec!(0));
    fx.set_max_size(dai(), U256::ZERO);

    let err = sweep(&mut fx, U256::ZERO).unwrap_err();
    assert_eq!(err, RebalanceError::ExceedsMaxTradeSize);
}

#[test]
fn test_sweep_requires_nothing_left_to_sell() {
    let mut fx = fixture(dec!(90), dec!(0));
    let err = sweep(&mut fx, U256::ZERO).unwrap_err();
    assert_eq!(err.to_string(), "Sell other set components first");
}

#[test]
fn test_sweep_refuses_reserve_below_target() {
    let mut fx = fixture(dec!(130), dec!(0.02));
    let err = sweep(&mut fx, U256::ZERO).unwrap_err();
    assert_eq!(err.to_string(), "WETH is below target unit");
}

#[test]
fn test_sweep_minimum_received_enforced() {
    let mut fx = fixture(dec!(130), dec!(0));
    let err = sweep(&mut fx, e18(dec!(201))).unwrap_err();
    assert!(matches!(err, RebalanceError::Ledger(_)));
}

#[test]
fn test_sweep_shares_trade_guards() {
    let mut fx = fixture(dec!(130), dec!(0));
    fx.set_cool_off(dai(), chrono::Duration::minutes(10));

    sweep(&mut fx, U256::ZERO).unwrap();

    // Custody is empty of WETH now, but the cool-off is checked first
    let err = sweep(&mut fx, U256::ZERO).unwrap_err();
    assert_eq!(err.to_string(), "Component cool off in progress");

    let err = fx
        .module
        .trade_remaining_weth(&mut fx.ledger, as_trader(), token(), weth(), U256::ZERO)
        .unwrap_err();
    assert_eq!(err, RebalanceError::CannotTradeReserve);
}
