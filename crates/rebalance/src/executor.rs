//! Trade Executor and WETH-Sweep Executor
//!
//! ```text
//! trade(component, limit)
//!   │  permission ─► parameters ─► size & direction ─► adapter
//!   ▼
//! approve + invoke swap through the token's custody
//!   │
//!   ▼
//! slippage check ─► protocol fee ─► position units ─► cool-off timestamp
//! ```
//!
//! Every step runs inside one host transaction; an error anywhere leaves
//! the module untouched and the host discards ledger mutations.

use basket_core::values::precise::{checked_add, checked_sub, precise_mul};
use basket_core::{Address, Bytes, CallContext, ModuleEvent, U256};
use basket_ports::{ExchangeAdapter, IndexLedger, TradeRequest};
use log::{debug, info};
use std::sync::Arc;

use crate::error::{RebalanceError, Result};
use crate::module::RebalanceModule;
use crate::position::calculate_and_edit_default_position;

/// Outcome of a successful trade or sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeReceipt {
    pub sell_component: Address,
    pub buy_component: Address,
    pub exchange_adapter: Address,
    pub executor: Address,
    pub net_amount_sold: U256,
    /// Received amount kept by the token, after the protocol fee
    pub net_amount_received: U256,
    pub protocol_fee: U256,
}

impl TradeReceipt {
    /// Amount delivered by the venue before the fee was taken
    pub fn gross_amount_received(&self) -> U256 {
        self.net_amount_received.saturating_add(self.protocol_fee)
    }
}

/// Everything needed to execute one swap
struct TradeInfo {
    token: Address,
    adapter: Arc<dyn ExchangeAdapter>,
    is_send_token_fixed: bool,
    send_token: Address,
    receive_token: Address,
    total_supply: U256,
    /// Exact amount sent, or the most that may be sent when buying
    send_quantity: U256,
    /// Least that may be received, or the exact amount bought
    floating_quantity_limit: U256,
    exchange_data: Bytes,
    pre_trade_send_balance: U256,
    pre_trade_receive_balance: U256,
}

impl TradeInfo {
    fn request(&self) -> TradeRequest {
        TradeRequest {
            source_token: self.send_token,
            destination_token: self.receive_token,
            destination_address: self.token,
            is_source_fixed: self.is_send_token_fixed,
            source_quantity: self.send_quantity,
            destination_quantity: self.floating_quantity_limit,
            data: self.exchange_data.clone(),
        }
    }
}

/// Balances moved by a settled trade
struct Settlement {
    net_sent: U256,
    net_received: U256,
    protocol_fee: U256,
}

impl RebalanceModule {
    /// Trade one component against the reserve asset toward its target.
    ///
    /// When selling, `reserve_quantity_limit` is the minimum reserve to
    /// receive; when buying it is the maximum reserve to spend.
    pub fn trade<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        ctx: CallContext,
        token: Address,
        component: Address,
        reserve_quantity_limit: U256,
    ) -> Result<TradeReceipt> {
        self.ensure_valid_token(&*ledger, token)?;
        self.ensure_allowed_trader(ctx, token)?;
        self.validate_trade_parameters(&*ledger, token, component)?;

        let info = self.create_trade_info(&*ledger, token, component, reserve_quantity_limit)?;
        let settlement = self.execute_trade(ledger, &info)?;

        self.complete_trade(ctx, component, &info, settlement)
    }

    /// Deploy reserve left over once nothing remains to sell.
    ///
    /// Sends the reserve's excess over its own target as the fixed leg. When
    /// that would buy more than the component's maximum size, buys exactly
    /// the maximum instead. Fails if the component would end above its
    /// target.
    pub fn trade_remaining_weth<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        ctx: CallContext,
        token: Address,
        component: Address,
        min_component_received: U256,
    ) -> Result<TradeReceipt> {
        self.ensure_valid_token(&*ledger, token)?;
        self.ensure_allowed_trader(ctx, token)?;
        self.validate_trade_parameters(&*ledger, token, component)?;

        if !self.no_tokens_to_sell(&*ledger, token)? {
            return Err(RebalanceError::SellOtherComponentsFirst);
        }
        let reserve = self.config.reserve_asset;
        if ledger.default_position_real_unit(token, reserve)?
            <= self.normalized_target_unit(&*ledger, token, reserve)?
        {
            return Err(RebalanceError::ReserveBelowTarget);
        }

        let max_size = self
            .execution_info(token, component)
            .map_or(U256::ZERO, |e| e.max_size);
        let mut info =
            self.create_remaining_trade_info(&*ledger, token, component, min_component_received)?;
        self.clamp_remaining_trade(ledger, &mut info, max_size)?;
        let settlement = self.execute_trade(ledger, &info)?;

        if checked_add(settlement.net_received, settlement.protocol_fee)? > max_size {
            return Err(RebalanceError::ExceedsMaxTradeSize);
        }
        if ledger.default_position_real_unit(token, component)?
            > self.normalized_target_unit(&*ledger, token, component)?
        {
            return Err(RebalanceError::ExceedsTargetUnit);
        }

        self.complete_trade(ctx, component, &info, settlement)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn validate_trade_parameters<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        token: Address,
        component: Address,
    ) -> Result<()> {
        if component == self.config.reserve_asset {
            return Err(RebalanceError::CannotTradeReserve);
        }
        if !self.state(token)?.rebalance.contains(&component) {
            return Err(RebalanceError::ComponentNotInRebalance(component));
        }
        if ledger.has_external_position(token, component)? {
            return Err(RebalanceError::ExternalPosition(component));
        }
        let cooled_off = self
            .execution_info(token, component)
            .is_none_or(|e| e.cool_off_elapsed(self.clock.now()));
        if !cooled_off {
            return Err(RebalanceError::CoolOffInProgress(component));
        }
        Ok(())
    }

    fn resolve_adapter(&self, token: Address, component: Address) -> Result<Arc<dyn ExchangeAdapter>> {
        let name = self
            .execution_info(token, component)
            .map(|e| e.exchange_name.clone())
            .unwrap_or_default();
        self.integrations
            .resolve(self.config.module, &name)
            .ok_or(RebalanceError::InvalidAdapter(name))
    }

    fn create_trade_info<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        token: Address,
        component: Address,
        reserve_quantity_limit: U256,
    ) -> Result<TradeInfo> {
        let reserve = self.config.reserve_asset;
        let total_supply = ledger.total_supply(token)?;
        let sizing = self.trade_size_and_direction(ledger, token, component, total_supply)?;
        let adapter = self.resolve_adapter(token, component)?;

        let (send_token, receive_token, send_quantity, floating_quantity_limit) =
            if sizing.is_selling {
                (component, reserve, sizing.quantity, reserve_quantity_limit)
            } else {
                let spendable = reserve_quantity_limit.min(ledger.balance_of(reserve, token));
                (reserve, component, spendable, sizing.quantity)
            };

        Ok(TradeInfo {
            token,
            adapter,
            is_send_token_fixed: sizing.is_selling,
            send_token,
            receive_token,
            total_supply,
            send_quantity,
            floating_quantity_limit,
            exchange_data: self.exchange_data(token, component),
            pre_trade_send_balance: ledger.balance_of(send_token, token),
            pre_trade_receive_balance: ledger.balance_of(receive_token, token),
        })
    }

    fn create_remaining_trade_info<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        token: Address,
        component: Address,
        min_component_received: U256,
    ) -> Result<TradeInfo> {
        let reserve = self.config.reserve_asset;
        let total_supply = ledger.total_supply(token)?;
        let reading = self.read_position(ledger, token, reserve, total_supply)?;
        if reading.current_notional <= reading.target_notional {
            return Err(RebalanceError::ReserveBelowTarget);
        }
        let adapter = self.resolve_adapter(token, component)?;

        Ok(TradeInfo {
            token,
            adapter,
            is_send_token_fixed: true,
            send_token: reserve,
            receive_token: component,
            total_supply,
            send_quantity: reading.current_notional - reading.target_notional,
            floating_quantity_limit: min_component_received,
            exchange_data: self.exchange_data(token, component),
            pre_trade_send_balance: ledger.balance_of(reserve, token),
            pre_trade_receive_balance: ledger.balance_of(component, token),
        })
    }

    /// Cap a sweep at the component's maximum trade size. When the whole
    /// reserve excess would buy more than `max_size`, buy exactly `max_size`
    /// instead, spending at most the excess.
    fn clamp_remaining_trade<L: IndexLedger + ?Sized>(
        &self,
        ledger: &mut L,
        info: &mut TradeInfo,
        max_size: U256,
    ) -> Result<()> {
        if max_size.is_zero() {
            return Err(RebalanceError::ExceedsMaxTradeSize);
        }
        ledger.invoke_approve(
            info.token,
            info.send_token,
            info.adapter.spender(),
            info.send_quantity,
        )?;
        let call = info.adapter.build_trade(&info.request())?;
        let output = ledger.static_invoke(info.token, &call)?;
        let quoted = info.adapter.decode_amount_received(&output)?;
        if quoted <= max_size {
            return Ok(());
        }
        if max_size < info.floating_quantity_limit {
            return Err(RebalanceError::SlippageExceeded);
        }

        debug!(
            "[TRADE] Sweep clamped: token={}, component={}, quoted={}, max_size={}",
            info.token, info.receive_token, quoted, max_size
        );
        info.is_send_token_fixed = false;
        info.floating_quantity_limit = max_size;
        Ok(())
    }

    fn exchange_data(&self, token: Address, component: Address) -> Bytes {
        self.execution_info(token, component)
            .map(|e| e.exchange_data.clone())
            .unwrap_or_default()
    }

    /// Swap through custody, check limits, take the fee and rewrite both
    /// legs' position units
    fn execute_trade<L: IndexLedger + ?Sized>(
        &self,
        ledger: &mut L,
        info: &TradeInfo,
    ) -> Result<Settlement> {
        ledger.invoke_approve(
            info.token,
            info.send_token,
            info.adapter.spender(),
            info.send_quantity,
        )?;

        let call = info.adapter.build_trade(&info.request())?;
        ledger.invoke(info.token, &call)?;

        let sent = checked_sub(
            info.pre_trade_send_balance,
            ledger.balance_of(info.send_token, info.token),
        )?;
        let received = checked_sub(
            ledger.balance_of(info.receive_token, info.token),
            info.pre_trade_receive_balance,
        )?;
        if sent > info.send_quantity || received < info.floating_quantity_limit {
            return Err(RebalanceError::SlippageExceeded);
        }

        let protocol_fee = self.accrue_protocol_fee(ledger, info, received)?;

        let post_send = calculate_and_edit_default_position(
            ledger,
            info.token,
            info.send_token,
            info.total_supply,
            info.pre_trade_send_balance,
        )?;
        let post_receive = calculate_and_edit_default_position(
            ledger,
            info.token,
            info.receive_token,
            info.total_supply,
            info.pre_trade_receive_balance,
        )?;

        let settlement = Settlement {
            net_sent: checked_sub(info.pre_trade_send_balance, post_send)?,
            net_received: checked_sub(post_receive, info.pre_trade_receive_balance)?,
            protocol_fee,
        };
        debug!(
            "[TRADE] Settled: token={}, sent={} of {}, received={} of {}, fee={}",
            info.token,
            settlement.net_sent,
            info.send_token,
            settlement.net_received,
            info.receive_token,
            settlement.protocol_fee
        );
        Ok(settlement)
    }

    /// Pay the protocol's cut of the received leg to the fee recipient
    fn accrue_protocol_fee<L: IndexLedger + ?Sized>(
        &self,
        ledger: &mut L,
        info: &TradeInfo,
        received: U256,
    ) -> Result<U256> {
        let percentage = self
            .controller
            .module_fee(self.config.module, self.config.protocol_fee_index);
        let fee = precise_mul(percentage, received)?;
        if !fee.is_zero() {
            ledger.invoke_transfer(
                info.token,
                info.receive_token,
                self.controller.fee_recipient(),
                fee,
            )?;
        }
        Ok(fee)
    }

    /// Stamp the cool-off clock and record the trade
    fn complete_trade(
        &mut self,
        ctx: CallContext,
        component: Address,
        info: &TradeInfo,
        settlement: Settlement,
    ) -> Result<TradeReceipt> {
        let now = self.clock.now();
        self.state_mut(info.token)?
            .execution
            .entry(component)
            .or_default()
            .last_trade_timestamp = now;

        let receipt = TradeReceipt {
            sell_component: info.send_token,
            buy_component: info.receive_token,
            exchange_adapter: info.adapter.address(),
            executor: ctx.sender,
            net_amount_sold: settlement.net_sent,
            net_amount_received: settlement.net_received,
            protocol_fee: settlement.protocol_fee,
        };

        info!(
            "[TRADE] Trade executed: token={}, sold={} {}, bought={} {}, fee={}, executor={}",
            info.token,
            receipt.net_amount_sold,
            receipt.sell_component,
            receipt.net_amount_received,
            receipt.buy_component,
            receipt.protocol_fee,
            receipt.executor
        );
        self.emit(ModuleEvent::TradeExecuted {
            token: info.token,
            sell_component: receipt.sell_component,
            buy_component: receipt.buy_component,
            exchange_adapter: receipt.exchange_adapter,
            executor: receipt.executor,
            net_amount_sold: receipt.net_amount_sold,
            net_amount_received: receipt.net_amount_received,
            protocol_fee: receipt.protocol_fee,
            timestamp: now,
        });
        Ok(receipt)
    }
}
