//! Execution Parameter Store
//!
//! Manager-facing setters for the per-component trade parameters. Each takes
//! parallel `(components, values)` arrays and overwrites entries positionally.

use basket_core::{Address, Bytes, CallContext, ModuleEvent, U256};
use basket_ports::IndexLedger;
use chrono::Duration;
use log::info;

use crate::error::{RebalanceError, Result};
use crate::module::RebalanceModule;
use crate::validation::validate_pairs;

impl RebalanceModule {
    /// Cap the component quantity traded in a single call
    pub fn set_trade_maximums<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &L,
        ctx: CallContext,
        token: Address,
        components: &[Address],
        max_sizes: &[U256],
    ) -> Result<()> {
        self.ensure_manager_and_valid_token(ledger, ctx, token)?;
        validate_pairs(components, max_sizes)?;

        let state = self.state_mut(token)?;
        for (component, max_size) in components.iter().zip(max_sizes) {
            state.execution.entry(*component).or_default().max_size = *max_size;
        }
        for (component, max_size) in components.iter().zip(max_sizes) {
            self.emit(ModuleEvent::TradeMaximumUpdated {
                token,
                component: *component,
                max_size: *max_size,
            });
        }

        info!(
            "[PARAMS] Trade maximums updated: token={}, components={}",
            token,
            components.len()
        );
        Ok(())
    }

    /// Assign exchanges by registered name. The reserve asset may be given
    /// an empty or unregistered name since it is never traded directly.
    pub fn set_exchanges<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &L,
        ctx: CallContext,
        token: Address,
        components: &[Address],
        exchange_names: &[String],
    ) -> Result<()> {
        self.ensure_manager_and_valid_token(ledger, ctx, token)?;
        validate_pairs(components, exchange_names)?;

        for (component, name) in components.iter().zip(exchange_names) {
            if *component != self.config.reserve_asset
                && !self.integrations.is_valid_adapter(self.config.module, name)
            {
                return Err(RebalanceError::UnrecognizedExchange(name.clone()));
            }
        }

        let state = self.state_mut(token)?;
        for (component, name) in components.iter().zip(exchange_names) {
            state.execution.entry(*component).or_default().exchange_name = name.clone();
        }
        for (component, name) in components.iter().zip(exchange_names) {
            self.emit(ModuleEvent::AssetExchangeUpdated {
                token,
                component: *component,
                exchange_name: name.clone(),
            });
        }

        info!(
            "[PARAMS] Exchanges updated: token={}, names={:?}",
            token, exchange_names
        );
        Ok(())
    }

    /// Opaque venue data forwarded to the adapter on every trade
    pub fn set_exchange_data<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &L,
        ctx: CallContext,
        token: Address,
        components: &[Address],
        exchange_data: &[Bytes],
    ) -> Result<()> {
        self.ensure_manager_and_valid_token(ledger, ctx, token)?;
        validate_pairs(components, exchange_data)?;

        let state = self.state_mut(token)?;
        for (component, data) in components.iter().zip(exchange_data) {
            state.execution.entry(*component).or_default().exchange_data = data.clone();
        }
        for (component, data) in components.iter().zip(exchange_data) {
            self.emit(ModuleEvent::ExchangeDataUpdated {
                token,
                component: *component,
                exchange_data: data.clone(),
            });
        }
        Ok(())
    }

    /// Minimum spacing between trades of the same component
    pub fn set_cool_off_periods<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &L,
        ctx: CallContext,
        token: Address,
        components: &[Address],
        cool_off_periods: &[Duration],
    ) -> Result<()> {
        self.ensure_manager_and_valid_token(ledger, ctx, token)?;
        validate_pairs(components, cool_off_periods)?;

        let state = self.state_mut(token)?;
        for (component, period) in components.iter().zip(cool_off_periods) {
            state.execution.entry(*component).or_default().cool_off_period = *period;
        }
        for (component, period) in components.iter().zip(cool_off_periods) {
            self.emit(ModuleEvent::CoolOffPeriodUpdated {
                token,
                component: *component,
                cool_off_seconds: period.num_seconds(),
            });
        }

        info!(
            "[PARAMS] Cool-off periods updated: token={}, components={}",
            token,
            components.len()
        );
        Ok(())
    }
}
