//! Permission Guard
//!
//! Per-token allow-list plus a public "anyone can trade" switch. While public
//! trading is on, calls must come straight from an externally-owned account.

use basket_core::{Address, CallContext, ModuleEvent};
use basket_ports::IndexLedger;
use log::info;

use crate::error::{RebalanceError, Result};
use crate::module::RebalanceModule;
use crate::validation::validate_pairs;

impl RebalanceModule {
    /// Add or remove traders from the allow-list
    pub fn set_trader_status<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &L,
        ctx: CallContext,
        token: Address,
        traders: &[Address],
        statuses: &[bool],
    ) -> Result<()> {
        self.ensure_manager_and_valid_token(ledger, ctx, token)?;
        validate_pairs(traders, statuses)?;

        let permissions = &mut self.state_mut(token)?.permissions;
        for (trader, status) in traders.iter().zip(statuses) {
            permissions.set_status(*trader, *status);
        }
        for (trader, status) in traders.iter().zip(statuses) {
            self.emit(ModuleEvent::TraderStatusUpdated {
                token,
                trader: *trader,
                status: *status,
            });
        }

        info!(
            "[PERMISSION] Trader status updated: token={}, traders={}",
            token,
            traders.len()
        );
        Ok(())
    }

    /// Toggle public trading
    pub fn set_anyone_trade<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &L,
        ctx: CallContext,
        token: Address,
        status: bool,
    ) -> Result<()> {
        self.ensure_manager_and_valid_token(ledger, ctx, token)?;

        self.state_mut(token)?.permissions.anyone_trade = status;
        self.emit(ModuleEvent::AnyoneTradeUpdated { token, status });

        info!(
            "[PERMISSION] Anyone trade updated: token={}, status={}",
            token, status
        );
        Ok(())
    }

    pub fn is_allowed_trader(&self, token: Address, trader: Address) -> bool {
        self.registry
            .get(&token)
            .is_some_and(|s| s.permissions.is_allowed(&trader))
    }

    /// Allow-listed traders in enumeration order
    pub fn allowed_traders(&self, token: Address) -> Vec<Address> {
        self.registry
            .get(&token)
            .map(|s| s.permissions.allow_list.to_vec())
            .unwrap_or_default()
    }

    pub fn anyone_trade(&self, token: Address) -> bool {
        self.registry
            .get(&token)
            .is_some_and(|s| s.permissions.anyone_trade)
    }

    /// Authorization applied to trades, sweeps and target raises
    pub(crate) fn ensure_allowed_trader(&self, ctx: CallContext, token: Address) -> Result<()> {
        let permissions = &self.state(token)?.permissions;
        if !permissions.is_allowed(&ctx.sender) {
            return Err(RebalanceError::TraderNotPermitted);
        }
        if permissions.anyone_trade && !ctx.is_eoa() {
            return Err(RebalanceError::CallerNotEoa);
        }
        Ok(())
    }
}
