//! Bootstrap - ledger, venue and module setup
//!
//! Builds everything a simulation needs from a [`SimulationConfig`]:
//! - Creating the index token and issuing the initial supply
//! - Listing every asset on a fixed-price venue with inventory
//! - Initializing the rebalancing module and declaring the rebalance
//! - Allow-listing the trader agents and the keeper

use alloy_primitives::keccak256;
use basket_clock::BlockClock;
use basket_core::values::precise::{checked_add, checked_mul, mul_div, precise_mul_ceil};
use basket_core::values::{precise_from_decimal, to_base_units};
use basket_core::{Address, CallContext, PRECISE_UNIT, U256};
use basket_ports::IndexLedger;
use basket_rebalance::{ModuleConfig, RebalanceModule};
use chrono::Duration;
use ledger_sim::{IntegrationRegistry, SimController, SimExchange, SimExchangeAdapter, SimLedger};
use log::info;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::host::RebalanceHost;

/// Name the venue adapter is registered under
pub const VENUE_NAME: &str = "fixed-price";

/// Multiple of the largest needed position the issuer holds of each component
const ISSUER_HEADROOM: u64 = 20;

const RESERVE_DECIMALS: u32 = 18;
const SUPPLY_DECIMALS: u32 = 18;

/// Deterministic address for a label
pub fn labeled_address(label: &str) -> Address {
    Address::from_word(keccak256(label.as_bytes()))
}

/// Venue price (reserve wei per base unit, 18 decimals) for a whole-token
/// price quoted in reserve
pub fn venue_price(price: Decimal, decimals: u32) -> Result<U256> {
    let one_token = to_base_units(Decimal::ONE, decimals)?;
    Ok(mul_div(precise_from_decimal(price)?, PRECISE_UNIT, one_token)?)
}

/// Fixed participants of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roles {
    pub token: Address,
    pub manager: Address,
    /// Issues and redeems index tokens for the supply feed
    pub issuer: Address,
    /// Raises targets once every component is on target
    pub keeper: Address,
    pub fee_recipient: Address,
    pub module: Address,
    pub venue: Address,
    pub adapter: Address,
}

impl Roles {
    pub fn derive() -> Self {
        Self {
            token: labeled_address("index-token"),
            manager: labeled_address("manager"),
            issuer: labeled_address("issuer"),
            keeper: labeled_address("keeper"),
            fee_recipient: labeled_address("fee-recipient"),
            module: labeled_address("rebalance-module"),
            venue: labeled_address("venue"),
            adapter: labeled_address("venue-adapter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub symbol: String,
    pub address: Address,
    pub decimals: u32,
}

/// Every asset of the simulation, reserve included
#[derive(Debug, Clone)]
pub struct AssetBook {
    pub reserve: Asset,
    /// In config order
    pub components: Vec<Asset>,
}

impl AssetBook {
    pub fn from_config(config: &SimulationConfig) -> Self {
        let asset = |symbol: &str, decimals: u32| Asset {
            symbol: symbol.to_string(),
            address: labeled_address(symbol),
            decimals,
        };
        Self {
            reserve: asset(&config.reserve.symbol, RESERVE_DECIMALS),
            components: config
                .components
                .iter()
                .map(|c| asset(&c.symbol, c.decimals))
                .collect(),
        }
    }

    pub fn get(&self, address: Address) -> Option<&Asset> {
        std::iter::once(&self.reserve)
            .chain(&self.components)
            .find(|a| a.address == address)
    }

    pub fn by_symbol(&self, symbol: &str) -> Result<&Asset> {
        std::iter::once(&self.reserve)
            .chain(&self.components)
            .find(|a| a.symbol == symbol)
            .ok_or_else(|| SimulationError::UnknownSymbol(symbol.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraderAccount {
    pub name: String,
    pub address: Address,
}

impl TraderAccount {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            address: labeled_address(name),
        }
    }
}

/// Ready-to-run simulation state
#[derive(Debug)]
pub struct SimulationBootstrap {
    pub host: RebalanceHost,
    pub clock: Arc<BlockClock>,
    pub assets: AssetBook,
    pub roles: Roles,
    pub traders: Vec<TraderAccount>,
}

impl SimulationBootstrap {
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;

        let roles = Roles::derive();
        let assets = AssetBook::from_config(config);
        let reserve = assets.reserve.address;
        let supply = to_base_units(config.initial_supply, SUPPLY_DECIMALS)?;
        let as_manager = CallContext::eoa(roles.manager);

        let mut ledger = SimLedger::new();
        let mut venue = SimExchange::new(roles.venue, VENUE_NAME, reserve);

        // Starting positions and targets, both in base units per index token
        let mut positions = Vec::new();
        let mut targets = HashMap::new();
        for (asset, component) in assets.components.iter().zip(&config.components) {
            let unit = to_base_units(component.unit, asset.decimals)?;
            let target = to_base_units(component.target, asset.decimals)?;
            if !unit.is_zero() {
                positions.push((asset.address, unit));
            }
            targets.insert(asset.address, target);

            let needed = precise_mul_ceil(unit.max(target), supply)?;
            ledger.mint(
                asset.address,
                roles.issuer,
                checked_mul(needed, U256::from(ISSUER_HEADROOM))?,
            )?;

            venue.set_price(asset.address, venue_price(component.price, asset.decimals)?);
            ledger.mint(
                asset.address,
                roles.venue,
                to_base_units(component.venue_inventory, asset.decimals)?,
            )?;
        }

        let reserve_unit = to_base_units(config.reserve.unit, RESERVE_DECIMALS)?;
        let reserve_target = to_base_units(config.reserve.target, RESERVE_DECIMALS)?;
        if !reserve_unit.is_zero() {
            positions.push((reserve, reserve_unit));
        }
        targets.insert(reserve, reserve_target);
        ledger.mint(
            reserve,
            roles.issuer,
            checked_add(
                precise_mul_ceil(reserve_unit, supply)?,
                to_base_units(config.reserve.issuer_inventory, RESERVE_DECIMALS)?,
            )?,
        )?;
        ledger.mint(
            reserve,
            roles.venue,
            to_base_units(config.reserve.venue_inventory, RESERVE_DECIMALS)?,
        )?;
        ledger.register_venue(venue);

        ledger.create_token(roles.token, roles.manager, &positions)?;
        ledger.add_module(roles.token, roles.module)?;
        ledger.issue(roles.token, roles.issuer, supply)?;

        let controller = Arc::new(SimController::new(roles.fee_recipient));
        controller.enable_token(roles.token);
        let module_config = ModuleConfig::new(roles.module, reserve);
        controller.set_module_fee(
            roles.module,
            module_config.protocol_fee_index,
            precise_from_decimal(config.protocol_fee)?,
        );

        let registry = Arc::new(IntegrationRegistry::new());
        registry.add_integration(
            roles.module,
            VENUE_NAME,
            Arc::new(SimExchangeAdapter::new(roles.adapter, roles.venue)),
        );

        let clock = Arc::new(BlockClock::genesis());
        let mut module = RebalanceModule::new(module_config, controller, registry, clock.clone());
        module.initialize(&mut ledger, as_manager, roles.token)?;

        // Execution parameters
        let mut components = Vec::new();
        let mut max_sizes = Vec::new();
        let mut cool_offs = Vec::new();
        for (asset, component) in assets.components.iter().zip(&config.components) {
            components.push(asset.address);
            max_sizes.push(to_base_units(component.max_trade_size, asset.decimals)?);
            cool_offs.push(Duration::seconds(component.cool_off_secs));
        }
        module.set_exchanges(
            &ledger,
            as_manager,
            roles.token,
            &components,
            &vec![VENUE_NAME.to_string(); components.len()],
        )?;
        module.set_trade_maximums(&ledger, as_manager, roles.token, &components, &max_sizes)?;
        module.set_cool_off_periods(&ledger, as_manager, roles.token, &components, &cool_offs)?;

        // Held components keep ledger order; components not yet held are
        // introduced by the rebalance
        let held = ledger.components(roles.token)?;
        let old_targets: Vec<U256> = held
            .iter()
            .map(|c| targets.get(c).copied().unwrap_or(U256::ZERO))
            .collect();
        let (new_components, new_targets): (Vec<Address>, Vec<U256>) = components
            .iter()
            .chain(std::iter::once(&reserve))
            .filter(|c| !held.contains(*c))
            .filter_map(|c| {
                let target = targets.get(c).copied().unwrap_or(U256::ZERO);
                (!target.is_zero()).then_some((*c, target))
            })
            .unzip();
        module.start_rebalance(
            &ledger,
            as_manager,
            roles.token,
            &new_components,
            &new_targets,
            &old_targets,
            ledger.position_multiplier(roles.token)?,
        )?;
        if let Some(percentage) = config.raise_target_percentage {
            module.set_raise_target_percentage(
                &ledger,
                as_manager,
                roles.token,
                precise_from_decimal(percentage)?,
            )?;
        }

        let traders: Vec<TraderAccount> = (0..config.traders.count)
            .map(|i| TraderAccount::new(&format!("trader-{i}")))
            .collect();
        if config.anyone_trade {
            module.set_anyone_trade(&ledger, as_manager, roles.token, true)?;
        } else {
            let allowed: Vec<Address> = traders
                .iter()
                .map(|t| t.address)
                .chain(std::iter::once(roles.keeper))
                .collect();
            module.set_trader_status(
                &ledger,
                as_manager,
                roles.token,
                &allowed,
                &vec![true; allowed.len()],
            )?;
        }
        module.take_events();

        info!(
            "[BOOTSTRAP] Rebalance declared: token={}, supply={}, components={}, traders={}",
            roles.token,
            supply,
            module.rebalance_components(roles.token).len(),
            traders.len()
        );

        Ok(Self {
            host: RebalanceHost::new(module, ledger, roles.token, roles.fee_recipient),
            clock,
            assets,
            roles,
            traders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_venue_price_scales_by_decimals() {
        assert_eq!(
            venue_price(dec!(0.01), 18).unwrap(),
            U256::from(10_000_000_000_000_000u64)
        );
        // 15 reserve per WBTC is 1.5e11 wei per satoshi
        assert_eq!(
            venue_price(dec!(15), 8).unwrap(),
            U256::from(150_000_000_000u64) * PRECISE_UNIT
        );
    }

    #[test]
    fn test_labeled_addresses_are_stable_and_distinct() {
        assert_eq!(labeled_address("WETH"), labeled_address("WETH"));
        assert_ne!(labeled_address("WETH"), labeled_address("DAI"));
        let roles = Roles::derive();
        assert_ne!(roles.manager, roles.keeper);
    }

    #[test]
    fn test_bootstrap_declares_rebalance() {
        let config = SimulationConfig::default();
        let boot = SimulationBootstrap::new(&config).unwrap();
        let host = &boot.host;
        let token = boot.roles.token;

        assert_eq!(
            host.ledger().total_supply(token).unwrap(),
            to_base_units(dec!(10), 18).unwrap()
        );
        assert_eq!(host.module().rebalance_components(token).len(), 3);

        let dai = boot.assets.by_symbol("DAI").unwrap().address;
        assert_eq!(
            host.module().execution_info(token, dai).unwrap().target_unit,
            to_base_units(dec!(50), 18).unwrap()
        );
        assert_eq!(
            host.ledger().balance_of(dai, token),
            to_base_units(dec!(1000), 18).unwrap()
        );

        assert_eq!(boot.traders.len(), 3);
        for trader in &boot.traders {
            assert!(host.module().is_allowed_trader(token, trader.address));
        }
        assert!(host.module().is_allowed_trader(token, boot.roles.keeper));
        assert!(host.events().is_empty());
    }

    #[test]
    fn test_unheld_component_is_introduced() {
        let mut config = SimulationConfig::default();
        config.components[0].unit = Decimal::ZERO;
        let boot = SimulationBootstrap::new(&config).unwrap();
        let token = boot.roles.token;
        let uni = boot.assets.by_symbol("UNI").unwrap().address;

        let components = boot.host.module().rebalance_components(token);
        assert_eq!(components.len(), 3);
        assert_eq!(components.last(), Some(&uni));
        assert!(boot.host.pending_trades().iter().any(|(c, t)| *c == uni && !t.is_selling));
    }
}
