//! Module attachment, parameter setters and rebalance declaration

mod common;

use basket_clock::BlockClock;
use basket_core::{Bytes, CallContext, ModuleEvent, ModuleState, U256};
use basket_ports::IndexLedger;
use basket_rebalance::{ModuleConfig, RebalanceError, RebalanceModule};
use chrono::Duration;
use common::*;
use ledger_sim::{IntegrationRegistry, SimController, SimLedger};
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Token with UNI 10 and DAI 100 per unit and the module added but not yet
/// initialized
fn pending() -> (SimLedger, RebalanceModule, Arc<SimController>) {
    let mut ledger = SimLedger::new();
    ledger
        .create_token(
            token(),
            manager(),
            &[(uni(), e18(dec!(10))), (dai(), e18(dec!(100)))],
        )
        .unwrap();
    ledger.add_module(token(), module_address()).unwrap();

    let controller = Arc::new(SimController::new(fee_recipient()));
    controller.enable_token(token());
    let module = RebalanceModule::new(
        ModuleConfig::new(module_address(), weth()),
        controller.clone(),
        Arc::new(IntegrationRegistry::new()),
        Arc::new(BlockClock::genesis()),
    );
    (ledger, module, controller)
}

#[test]
fn test_initialize_seeds_targets_with_current_units() {
    let (mut ledger, mut module, _) = pending();
    module
        .initialize(&mut ledger, as_manager(), token())
        .unwrap();

    assert!(module.is_tracking(token()));
    assert_eq!(
        ledger.module_state(token(), module_address()).unwrap(),
        ModuleState::Initialized
    );
    assert_eq!(
        module.execution_info(token(), uni()).unwrap().target_unit,
        e18(dec!(10))
    );
    assert_eq!(
        module.execution_info(token(), dai()).unwrap().target_unit,
        e18(dec!(100))
    );
    assert!(module.rebalance_components(token()).is_empty());
    assert!(!module.rebalance_info(token()).unwrap().is_active());
}

#[test]
fn test_initialize_guards() {
    let (mut ledger, mut module, controller) = pending();

    assert_eq!(
        module
            .initialize(&mut ledger, as_trader(), token())
            .unwrap_err(),
        RebalanceError::NotManager
    );

    controller.disable_token(token());
    assert_eq!(
        module
            .initialize(&mut ledger, as_manager(), token())
            .unwrap_err(),
        RebalanceError::InvalidToken
    );
    controller.enable_token(token());

    ledger.set_external_position(token(), dai(), true).unwrap();
    assert_eq!(
        module
            .initialize(&mut ledger, as_manager(), token())
            .unwrap_err(),
        RebalanceError::ExternalPosition(dai())
    );
    assert!(!module.is_tracking(token()));
    ledger.set_external_position(token(), dai(), false).unwrap();

    module
        .initialize(&mut ledger, as_manager(), token())
        .unwrap();
    assert_eq!(
        module
            .initialize(&mut ledger, as_manager(), token())
            .unwrap_err(),
        RebalanceError::NotPendingInitialization
    );
}

#[test]
fn test_operations_before_rebalance_declared() {
    let (mut ledger, mut module, _) = pending();
    module
        .initialize(&mut ledger, as_manager(), token())
        .unwrap();
    module
        .set_trader_status(&ledger, as_manager(), token(), &[trader()], &[true])
        .unwrap();
    module
        .set_raise_target_percentage(&ledger, as_manager(), token(), e18(dec!(0.0025)))
        .unwrap();

    assert_eq!(
        module
            .raise_asset_targets(&ledger, as_trader(), token())
            .unwrap_err(),
        RebalanceError::NoActiveRebalance
    );
    assert_eq!(
        module
            .raise_asset_targets(&ledger, as_trader(), token())
            .unwrap_err()
            .to_string(),
        "No active rebalance"
    );

    // Nothing is under rebalance yet, so components are unknown to sizing
    assert_eq!(
        module
            .component_trade_quantity_and_direction(&ledger, token(), uni())
            .unwrap_err(),
        RebalanceError::ComponentNotRecognized(uni())
    );
    assert_eq!(
        module
            .trade(&mut ledger, as_trader(), token(), uni(), U256::ZERO)
            .unwrap_err(),
        RebalanceError::ComponentNotInRebalance(uni())
    );
}

#[test]
fn test_remove_module_discards_state() {
    let mut fx = Fixture::scenario_a();
    fx.start_rebalance(&[], &[], &Fixture::scenario_a_targets());

    assert_eq!(
        fx.module
            .remove_module(&mut fx.ledger, as_trader(), token())
            .unwrap_err(),
        RebalanceError::NotManager
    );
    fx.module
        .remove_module(&mut fx.ledger, as_manager(), token())
        .unwrap();

    assert!(!fx.module.is_tracking(token()));
    assert!(fx.module.execution_info(token(), dai()).is_none());
    assert!(fx.module.allowed_traders(token()).is_empty());
    assert_eq!(
        fx.module
            .trade(&mut fx.ledger, as_trader(), token(), dai(), U256::ZERO)
            .unwrap_err(),
        RebalanceError::InvalidToken
    );
    assert_eq!(
        fx.module
            .set_anyone_trade(&fx.ledger, as_manager(), token(), true)
            .unwrap_err(),
        RebalanceError::InvalidToken
    );

    // Re-adding starts from a clean slate
    fx.ledger.add_module(token(), module_address()).unwrap();
    fx.module
        .initialize(&mut fx.ledger, as_manager(), token())
        .unwrap();
    let dai_info = fx.module.execution_info(token(), dai()).unwrap();
    assert_eq!(dai_info.target_unit, e18(dec!(100)));
    assert!(dai_info.max_size.is_zero());
    assert!(!fx.module.is_allowed_trader(token(), trader()));
}

#[test]
fn test_setters_overwrite_and_emit() {
    let mut fx = Fixture::scenario_a();

    fx.module
        .set_trade_maximums(
            &fx.ledger,
            as_manager(),
            token(),
            &[uni(), dai()],
            &[e18(dec!(5)), e18(dec!(7))],
        )
        .unwrap();
    fx.module
        .set_exchange_data(
            &fx.ledger,
            as_manager(),
            token(),
            &[uni()],
            &[Bytes::from_static(b"route")],
        )
        .unwrap();
    fx.module
        .set_cool_off_periods(
            &fx.ledger,
            as_manager(),
            token(),
            &[dai()],
            &[Duration::minutes(30)],
        )
        .unwrap();

    let uni_info = fx.module.execution_info(token(), uni()).unwrap();
    assert_eq!(uni_info.max_size, e18(dec!(5)));
    assert_eq!(uni_info.exchange_data, Bytes::from_static(b"route"));
    assert_eq!(uni_info.exchange_name, EXCHANGE);
    let dai_info = fx.module.execution_info(token(), dai()).unwrap();
    assert_eq!(dai_info.max_size, e18(dec!(7)));
    assert_eq!(dai_info.cool_off_period, Duration::minutes(30));

    let events = fx.module.take_events();
    assert_eq!(events.len(), 4);
    assert_eq!(
        events[1],
        ModuleEvent::TradeMaximumUpdated {
            token: token(),
            component: dai(),
            max_size: e18(dec!(7)),
        }
    );
    assert_eq!(
        events[3],
        ModuleEvent::CoolOffPeriodUpdated {
            token: token(),
            component: dai(),
            cool_off_seconds: 1800,
        }
    );
    assert!(events.iter().all(|e| e.token() == token()));
}

#[test]
fn test_setter_validation() {
    let mut fx = Fixture::scenario_a();

    let err = fx
        .module
        .set_trade_maximums(&fx.ledger, as_trader(), token(), &[uni()], &[U256::ZERO])
        .unwrap_err();
    assert_eq!(err, RebalanceError::NotManager);

    let err = fx
        .module
        .set_trade_maximums(&fx.ledger, as_manager(), token(), &[uni(), dai()], &[U256::ZERO])
        .unwrap_err();
    assert_eq!(err, RebalanceError::ArrayLengthMismatch);

    let err = fx
        .module
        .set_cool_off_periods(&fx.ledger, as_manager(), token(), &[], &[])
        .unwrap_err();
    assert_eq!(err, RebalanceError::EmptyArray);

    let err = fx
        .module
        .set_exchange_data(
            &fx.ledger,
            as_manager(),
            token(),
            &[dai(), dai()],
            &[Bytes::new(), Bytes::new()],
        )
        .unwrap_err();
    assert_eq!(err, RebalanceError::DuplicateAddresses);

    let err = fx
        .module
        .set_exchanges(
            &fx.ledger,
            as_manager(),
            token(),
            &[dai()],
            &["nowhere".to_string()],
        )
        .unwrap_err();
    assert_eq!(err, RebalanceError::UnrecognizedExchange("nowhere".to_string()));
    assert_eq!(fx.module.execution_info(token(), dai()).unwrap().exchange_name, EXCHANGE);

    // The reserve is never traded directly, so any name is accepted
    fx.module
        .set_exchanges(&fx.ledger, as_manager(), token(), &[weth()], &[String::new()])
        .unwrap();
}

#[test]
fn test_start_rebalance_validation() {
    let mut fx = Fixture::scenario_a();
    let targets = Fixture::scenario_a_targets();
    let multiplier = fx.ledger.position_multiplier(token()).unwrap();

    let cases = [
        (
            vec![],
            vec![],
            targets[..2].to_vec(),
            multiplier,
            RebalanceError::OldComponentTargetsMissing,
        ),
        (
            vec![uni()],
            vec![],
            targets.clone(),
            multiplier,
            RebalanceError::ArrayLengthMismatch,
        ),
        (
            vec![dai()],
            vec![e18(dec!(1))],
            targets.clone(),
            multiplier,
            RebalanceError::DuplicateComponents,
        ),
        (
            vec![],
            vec![],
            targets.clone(),
            U256::ZERO,
            RebalanceError::InvalidPositionMultiplier,
        ),
    ];
    for (new_components, new_targets, old_targets, multiplier, expected) in cases {
        let err = fx
            .module
            .start_rebalance(
                &fx.ledger,
                as_manager(),
                token(),
                &new_components,
                &new_targets,
                &old_targets,
                multiplier,
            )
            .unwrap_err();
        assert_eq!(err, expected);
    }

    fx.ledger.set_external_position(token(), wbtc(), true).unwrap();
    let err = fx
        .module
        .start_rebalance(&fx.ledger, as_manager(), token(), &[], &[], &targets, multiplier)
        .unwrap_err();
    assert_eq!(err, RebalanceError::ExternalPosition(wbtc()));

    let err = fx
        .module
        .start_rebalance(&fx.ledger, as_trader(), token(), &[], &[], &targets, multiplier)
        .unwrap_err();
    assert_eq!(err, RebalanceError::NotManager);

    // Nothing was recorded by the failed attempts
    assert!(fx.module.rebalance_components(token()).is_empty());
    assert_eq!(
        fx.module.execution_info(token(), dai()).unwrap().target_unit,
        e18(dec!(100))
    );
}

#[test]
fn test_start_rebalance_records_snapshot() {
    let mut fx = Fixture::scenario_a();
    fx.start_rebalance(&[weth()], &[e18(dec!(0.1))], &Fixture::scenario_a_targets());

    assert_eq!(fx.module.rebalance_components(token()), vec![uni(), wbtc(), dai(), weth()]);
    let info = fx.module.rebalance_info(token()).unwrap();
    assert!(info.is_active());
    assert_eq!(
        info.position_multiplier.raw(),
        fx.ledger.position_multiplier(token()).unwrap()
    );
    assert_eq!(
        fx.module.execution_info(token(), weth()).unwrap().target_unit,
        e18(dec!(0.1))
    );

    let events = fx.module.take_events();
    assert!(matches!(
        events.as_slice(),
        [ModuleEvent::RebalanceStarted { components, .. }] if components.len() == 4
    ));
}

#[test]
fn test_raise_target_percentage_must_be_positive() {
    let mut fx = Fixture::scenario_a();
    assert_eq!(
        fx.module
            .set_raise_target_percentage(&fx.ledger, as_manager(), token(), U256::ZERO)
            .unwrap_err(),
        RebalanceError::InvalidRaiseTargetPercentage
    );
    fx.module
        .set_raise_target_percentage(&fx.ledger, as_manager(), token(), e18(dec!(0.0025)))
        .unwrap();
    assert_eq!(
        fx.module.rebalance_info(token()).unwrap().raise_target_percentage,
        e18(dec!(0.0025))
    );
}

#[test]
fn test_allow_list_enumeration_after_removal() {
    let mut fx = Fixture::scenario_a();
    let traders = [addr(0x61), addr(0x62), addr(0x63)];
    fx.module
        .set_trader_status(&fx.ledger, as_manager(), token(), &traders, &[true; 3])
        .unwrap();
    assert_eq!(
        fx.module.allowed_traders(token()),
        vec![trader(), addr(0x61), addr(0x62), addr(0x63)]
    );

    fx.module
        .set_trader_status(&fx.ledger, as_manager(), token(), &[trader()], &[false])
        .unwrap();
    assert_eq!(
        fx.module.allowed_traders(token()),
        vec![addr(0x63), addr(0x61), addr(0x62)]
    );
    assert!(!fx.module.is_allowed_trader(token(), trader()));

    // Removing an address that was never listed is a no-op
    fx.module
        .set_trader_status(&fx.ledger, as_manager(), token(), &[addr(0x99)], &[false])
        .unwrap();
    assert_eq!(fx.module.allowed_traders(token()).len(), 3);
}

#[test]
fn test_anyone_trade_requires_eoa() {
    let mut fx = Fixture::scenario_a();
    fx.start_rebalance(&[], &[], &Fixture::scenario_a_targets());
    let outsider = addr(0x62);

    assert_eq!(
        fx.module
            .trade(&mut fx.ledger, CallContext::eoa(outsider), token(), dai(), U256::ZERO)
            .unwrap_err(),
        RebalanceError::TraderNotPermitted
    );

    fx.module
        .set_anyone_trade(&fx.ledger, as_manager(), token(), true)
        .unwrap();
    assert!(fx.module.anyone_trade(token()));
    assert_eq!(
        fx.module
            .trade(
                &mut fx.ledger,
                CallContext::via_contract(addr(0x63), outsider),
                token(),
                dai(),
                U256::ZERO,
            )
            .unwrap_err(),
        RebalanceError::CallerNotEoa
    );
    fx.module
        .trade(&mut fx.ledger, CallContext::eoa(outsider), token(), dai(), U256::ZERO)
        .unwrap();
}
