//! Shared fixture: one index token on a simulated ledger, a fixed-price
//! venue registered as "sim", and an initialized rebalancing module.

#![allow(dead_code)]

use basket_clock::BlockClock;
use basket_core::values::precise::precise_mul_ceil;
use basket_core::values::to_base_units;
use basket_core::{Address, CallContext, U256};
use basket_ports::IndexLedger;
use basket_rebalance::{ModuleConfig, RebalanceModule};
use chrono::Duration;
use ledger_sim::{IntegrationRegistry, SimController, SimExchange, SimExchangeAdapter, SimLedger};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

pub const EXCHANGE: &str = "sim";

pub fn addr(b: u8) -> Address {
    Address::repeat_byte(b)
}

pub fn token() -> Address {
    addr(0x10)
}
pub fn manager() -> Address {
    addr(0x20)
}
pub fn trader() -> Address {
    addr(0x21)
}
pub fn issuer() -> Address {
    addr(0x30)
}
pub fn fee_recipient() -> Address {
    addr(0x40)
}
pub fn module_address() -> Address {
    addr(0x77)
}
pub fn venue_address() -> Address {
    addr(0x51)
}
pub fn adapter_address() -> Address {
    addr(0xad)
}

pub fn uni() -> Address {
    addr(0x01)
}
pub fn wbtc() -> Address {
    addr(0x02)
}
pub fn dai() -> Address {
    addr(0x03)
}
pub fn weth() -> Address {
    addr(0xee)
}

/// Human amount to base units with `decimals` places
pub fn units(value: Decimal, decimals: u32) -> U256 {
    to_base_units(value, decimals).unwrap()
}

pub fn e18(value: Decimal) -> U256 {
    units(value, 18)
}

pub fn as_manager() -> CallContext {
    CallContext::eoa(manager())
}

pub fn as_trader() -> CallContext {
    CallContext::eoa(trader())
}

pub struct Fixture {
    pub ledger: SimLedger,
    pub module: RebalanceModule,
    pub controller: Arc<SimController>,
    pub registry: Arc<IntegrationRegistry>,
    pub clock: Arc<BlockClock>,
}

impl Fixture {
    /// Token holding `positions` (component, real unit) with `supply` issued,
    /// module initialized, exchanges set, generous trade maximums, and
    /// `trader()` on the allow-list
    pub fn new(positions: &[(Address, U256)], supply: U256) -> Self {
        Self::with_config(ModuleConfig::new(module_address(), weth()), positions, supply)
    }

    pub fn with_config(config: ModuleConfig, positions: &[(Address, U256)], supply: U256) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut ledger = SimLedger::new();
        ledger.create_token(token(), manager(), positions).unwrap();
        ledger.add_module(token(), module_address()).unwrap();

        for (component, unit) in positions {
            let needed = precise_mul_ceil(*unit, supply).unwrap();
            ledger.mint(*component, issuer(), needed).unwrap();
        }
        if !supply.is_zero() {
            ledger.issue(token(), issuer(), supply).unwrap();
        }

        // Prices in WETH wei per base unit: UNI 0.01, WBTC 15 (8 decimals), DAI 0.0005
        let mut venue = SimExchange::new(venue_address(), EXCHANGE, weth());
        venue.set_price(uni(), e18(dec!(0.01)));
        venue.set_price(wbtc(), e18(dec!(150000000000)));
        venue.set_price(dai(), e18(dec!(0.0005)));
        ledger.register_venue(venue);
        ledger.mint(weth(), venue_address(), e18(dec!(1000))).unwrap();
        ledger.mint(uni(), venue_address(), e18(dec!(1000000))).unwrap();
        ledger.mint(wbtc(), venue_address(), units(dec!(10000), 8)).unwrap();
        ledger.mint(dai(), venue_address(), e18(dec!(1000000))).unwrap();

        let controller = Arc::new(SimController::new(fee_recipient()));
        controller.enable_token(token());

        let registry = Arc::new(IntegrationRegistry::new());
        registry.add_integration(
            module_address(),
            EXCHANGE,
            Arc::new(SimExchangeAdapter::new(adapter_address(), venue_address())),
        );

        let clock = Arc::new(BlockClock::genesis());
        let mut module = RebalanceModule::new(
            config,
            controller.clone(),
            registry.clone(),
            clock.clone(),
        );
        module
            .initialize(&mut ledger, as_manager(), token())
            .unwrap();

        let tradeable = [uni(), wbtc(), dai()];
        module
            .set_exchanges(
                &ledger,
                as_manager(),
                token(),
                &tradeable,
                &vec![EXCHANGE.to_string(); 3],
            )
            .unwrap();
        module
            .set_trade_maximums(
                &ledger,
                as_manager(),
                token(),
                &tradeable,
                &[
                    e18(dec!(10000)),
                    units(dec!(100), 8),
                    e18(dec!(10000)),
                ],
            )
            .unwrap();
        module
            .set_trader_status(&ledger, as_manager(), token(), &[trader()], &[true])
            .unwrap();
        module.take_events();

        Self {
            ledger,
            module,
            controller,
            registry,
            clock,
        }
    }

    /// UNI 86.9565217, WBTC 0.01111111, DAI 100 per token; 10 tokens issued
    pub fn scenario_a() -> Self {
        Self::scenario_a_with(ModuleConfig::new(module_address(), weth()))
    }

    pub fn scenario_a_with(config: ModuleConfig) -> Self {
        Self::with_config(
            config,
            &[
                (uni(), e18(dec!(86.9565217))),
                (wbtc(), units(dec!(0.01111111), 8)),
                (dai(), e18(dec!(100))),
            ],
            e18(dec!(10)),
        )
    }

    /// Scenario A targets: UNI 60.869565780223716593, WBTC 0.02, DAI 50
    pub fn scenario_a_targets() -> Vec<U256> {
        vec![
            e18(dec!(60.869565780223716593)),
            units(dec!(0.02), 8),
            e18(dec!(50)),
        ]
    }

    pub fn start_rebalance(
        &mut self,
        new_components: &[Address],
        new_targets: &[U256],
        old_targets: &[U256],
    ) {
        let multiplier = self.ledger.position_multiplier(token()).unwrap();
        self.module
            .start_rebalance(
                &self.ledger,
                as_manager(),
                token(),
                new_components,
                new_targets,
                old_targets,
                multiplier,
            )
            .unwrap();
    }

    pub fn set_cool_off(&mut self, component: Address, period: Duration) {
        self.module
            .set_cool_off_periods(&self.ledger, as_manager(), token(), &[component], &[period])
            .unwrap();
    }

    pub fn set_max_size(&mut self, component: Address, max_size: U256) {
        self.module
            .set_trade_maximums(&self.ledger, as_manager(), token(), &[component], &[max_size])
            .unwrap();
    }

    pub fn set_protocol_fee(&self, percentage: Decimal) {
        self.controller.set_module_fee(
            module_address(),
            self.module.config().protocol_fee_index,
            e18(percentage),
        );
    }

    pub fn unit(&self, component: Address) -> U256 {
        self.ledger
            .default_position_real_unit(token(), component)
            .unwrap()
    }

    pub fn custody(&self, asset: Address) -> U256 {
        self.ledger.balance_of(asset, token())
    }

    pub fn advance(&self, seconds: i64) {
        self.clock.mine(Duration::seconds(seconds));
    }
}
