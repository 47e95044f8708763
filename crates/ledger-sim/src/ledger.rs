//! In-memory index token ledger with custody balances

use basket_core::values::precise::{checked_add, checked_sub, precise_mul, precise_mul_ceil};
use basket_core::{Address, Bytes, ModuleState, PositionMultiplier, U256};
use basket_ports::{IndexLedger, LedgerError, LedgerResult, TradeCall};
use log::{debug, info};
use std::collections::HashMap;

use crate::codec::{SwapCalldata, SwapOrder};
use crate::error::VenueError;
use crate::exchange::SimExchange;
use crate::token::SimIndexToken;

/// Ledger of index tokens, ERC20-style balances and allowances, and the
/// exchange venues reachable through delegated invocation.
///
/// Cloning takes a full snapshot, which hosts use to roll back a failed
/// transaction.
#[derive(Debug, Clone, Default)]
pub struct SimLedger {
    tokens: HashMap<Address, SimIndexToken>,
    /// (asset, holder) -> balance
    balances: HashMap<(Address, Address), U256>,
    /// (asset, owner, spender) -> allowance
    allowances: HashMap<(Address, Address, Address), U256>,
    venues: HashMap<Address, SimExchange>,
}

impl SimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Setup
    // ========================================================================

    /// Register an index token holding `positions` as (component, real unit)
    pub fn create_token(
        &mut self,
        token: Address,
        manager: Address,
        positions: &[(Address, U256)],
    ) -> LedgerResult<()> {
        let mut record = SimIndexToken::new(token, manager);
        for (component, unit) in positions {
            record.set_virtual_unit(*component, *unit);
        }
        self.tokens.insert(token, record);
        info!(
            "[LEDGER] Index token created: token={}, components={}",
            token,
            positions.len()
        );
        Ok(())
    }

    /// Mark a module as added, pending its own initialization
    pub fn add_module(&mut self, token: Address, module: Address) -> LedgerResult<()> {
        self.token_mut(token)?
            .modules
            .insert(module, ModuleState::Pending);
        Ok(())
    }

    pub fn set_external_position(
        &mut self,
        token: Address,
        component: Address,
        external: bool,
    ) -> LedgerResult<()> {
        let record = self.token_mut(token)?;
        if external {
            record.external_positions.insert(component);
        } else {
            record.external_positions.remove(&component);
        }
        Ok(())
    }

    pub fn register_venue(&mut self, venue: SimExchange) {
        self.venues.insert(venue.address(), venue);
    }

    /// Credit `amount` of `asset` out of thin air
    pub fn mint(&mut self, asset: Address, holder: Address, amount: U256) -> LedgerResult<()> {
        let balance = self.balances.entry((asset, holder)).or_default();
        *balance = checked_add(*balance, amount)?;
        Ok(())
    }

    pub fn token(&self, token: Address) -> LedgerResult<&SimIndexToken> {
        self.tokens.get(&token).ok_or(LedgerError::UnknownToken(token))
    }

    fn token_mut(&mut self, token: Address) -> LedgerResult<&mut SimIndexToken> {
        self.tokens
            .get_mut(&token)
            .ok_or(LedgerError::UnknownToken(token))
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    pub fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> LedgerResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                asset,
                holder: from,
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = checked_add(self.balance_of(asset, to), amount)?;
        self.balances.insert((asset, from), available - amount);
        self.balances.insert((asset, to), credited);
        Ok(())
    }

    /// Transfer on behalf of `owner`, consuming `spender`'s allowance
    pub fn transfer_from(
        &mut self,
        asset: Address,
        owner: Address,
        spender: Address,
        to: Address,
        amount: U256,
    ) -> LedgerResult<()> {
        let approved = self.allowance(asset, owner, spender);
        if approved < amount {
            return Err(LedgerError::InsufficientAllowance {
                asset,
                owner,
                spender,
                needed: amount,
                approved,
            });
        }
        self.transfer(asset, owner, to, amount)?;
        self.allowances
            .insert((asset, owner, spender), approved - amount);
        Ok(())
    }

    pub fn allowance(&self, asset: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    // ========================================================================
    // Supply changes
    // ========================================================================

    /// Issue `quantity` index tokens to `to`, pulling each component from
    /// `to` at `ceil(unit × quantity)`
    pub fn issue(&mut self, token: Address, to: Address, quantity: U256) -> LedgerResult<()> {
        let required = self.component_amounts(token, quantity, true)?;
        for (component, amount) in &required {
            let available = self.balance_of(*component, to);
            if available < *amount {
                return Err(LedgerError::InsufficientBalance {
                    asset: *component,
                    holder: to,
                    needed: *amount,
                    available,
                });
            }
        }
        for (component, amount) in required {
            self.transfer(component, to, token, amount)?;
        }
        let record = self.token_mut(token)?;
        record.total_supply = checked_add(record.total_supply, quantity)?;
        self.mint(token, to, quantity)?;

        debug!("[LEDGER] Issued: token={}, to={}, quantity={}", token, to, quantity);
        Ok(())
    }

    /// Burn `quantity` index tokens from `from`, returning each component at
    /// `floor(unit × quantity)`
    pub fn redeem(&mut self, token: Address, from: Address, quantity: U256) -> LedgerResult<()> {
        let held = self.balance_of(token, from);
        if held < quantity {
            return Err(LedgerError::InsufficientBalance {
                asset: token,
                holder: from,
                needed: quantity,
                available: held,
            });
        }
        let returned = self.component_amounts(token, quantity, false)?;
        let record = self.token_mut(token)?;
        record.total_supply = checked_sub(record.total_supply, quantity)?;
        self.balances.insert((token, from), held - quantity);
        for (component, amount) in returned {
            self.transfer(component, token, from, amount)?;
        }

        debug!("[LEDGER] Redeemed: token={}, from={}, quantity={}", token, from, quantity);
        Ok(())
    }

    /// Streaming fee: mint `supply × inflation / (1 - inflation)` to
    /// `recipient` and dilute the multiplier by `(1 - inflation)`.
    /// Returns the quantity minted.
    pub fn accrue_streaming_fee(
        &mut self,
        token: Address,
        recipient: Address,
        inflation: U256,
    ) -> LedgerResult<U256> {
        let record = self.token(token)?;
        let remaining = checked_sub(basket_core::PRECISE_UNIT, inflation)?;
        let fee_quantity = basket_core::values::precise::mul_div(
            inflation,
            record.total_supply,
            remaining,
        )?;
        let diluted = record.position_multiplier.dilute(inflation)?;

        let record = self.token_mut(token)?;
        record.total_supply = checked_add(record.total_supply, fee_quantity)?;
        record.position_multiplier = diluted;
        self.mint(token, recipient, fee_quantity)?;

        info!(
            "[LEDGER] Streaming fee accrued: token={}, minted={}, multiplier={}",
            token, fee_quantity, diluted
        );
        Ok(fee_quantity)
    }

    fn component_amounts(
        &self,
        token: Address,
        quantity: U256,
        round_up: bool,
    ) -> LedgerResult<Vec<(Address, U256)>> {
        let record = self.token(token)?;
        record
            .components
            .iter()
            .map(|component| -> LedgerResult<(Address, U256)> {
                let unit = self.default_position_real_unit(token, *component)?;
                let amount = if round_up {
                    precise_mul_ceil(unit, quantity)?
                } else {
                    precise_mul(unit, quantity)?
                };
                Ok((*component, amount))
            })
            .collect()
    }

    // ========================================================================
    // Venue execution
    // ========================================================================

    /// Settle a swap at `venue` for `trader`: pull the input through the
    /// trader's allowance to the venue, pay the output to the recipient.
    /// Every check runs before any balance moves.
    fn execute_swap(
        &mut self,
        venue: &SimExchange,
        trader: Address,
        order: &SwapOrder,
    ) -> LedgerResult<U256> {
        let (amount_in, amount_out) = if order.exact_input {
            let out = venue.quote_exact_input(order.source, order.destination, order.amount_in)?;
            if out < order.amount_out {
                return Err(VenueError::MinimumOutputNotMet {
                    out,
                    min_out: order.amount_out,
                }
                .into());
            }
            (order.amount_in, out)
        } else {
            let amount_in =
                venue.quote_exact_output(order.source, order.destination, order.amount_out)?;
            if amount_in > order.amount_in {
                return Err(VenueError::MaximumInputExceeded {
                    amount_in,
                    max_in: order.amount_in,
                }
                .into());
            }
            (amount_in, order.amount_out)
        };

        let inventory = self.balance_of(order.destination, venue.address());
        if inventory < amount_out {
            return Err(VenueError::InsufficientInventory {
                asset: order.destination,
                needed: amount_out,
                available: inventory,
            }
            .into());
        }

        self.transfer_from(
            order.source,
            trader,
            venue.address(),
            venue.address(),
            amount_in,
        )?;
        self.transfer(
            order.destination,
            venue.address(),
            order.recipient,
            amount_out,
        )?;

        debug!(
            "[VENUE] Swap settled: venue={}, in={} {}, out={} {}",
            venue.name(),
            amount_in,
            order.source,
            amount_out,
            order.destination
        );
        Ok(amount_out)
    }
}

impl IndexLedger for SimLedger {
    fn manager(&self, token: Address) -> LedgerResult<Address> {
        Ok(self.token(token)?.manager)
    }

    fn total_supply(&self, token: Address) -> LedgerResult<U256> {
        Ok(self.token(token)?.total_supply)
    }

    fn position_multiplier(&self, token: Address) -> LedgerResult<U256> {
        Ok(self.token(token)?.position_multiplier.raw())
    }

    fn components(&self, token: Address) -> LedgerResult<Vec<Address>> {
        Ok(self.token(token)?.components.clone())
    }

    fn default_position_real_unit(
        &self,
        token: Address,
        component: Address,
    ) -> LedgerResult<U256> {
        let record = self.token(token)?;
        let virtual_unit = record
            .virtual_units
            .get(&component)
            .copied()
            .unwrap_or_default();
        Ok(record.position_multiplier.real_unit(virtual_unit)?)
    }

    fn has_external_position(&self, token: Address, component: Address) -> LedgerResult<bool> {
        Ok(self.token(token)?.external_positions.contains(&component))
    }

    fn module_state(&self, token: Address, module: Address) -> LedgerResult<ModuleState> {
        Ok(self.token(token)?.module_state(&module))
    }

    fn initialize_module(&mut self, token: Address, module: Address) -> LedgerResult<()> {
        let record = self.token_mut(token)?;
        if record.module_state(&module) != ModuleState::Pending {
            return Err(LedgerError::InvalidModuleState {
                token,
                module,
                expected: "pending".to_string(),
            });
        }
        record.modules.insert(module, ModuleState::Initialized);
        Ok(())
    }

    fn remove_module(&mut self, token: Address, module: Address) -> LedgerResult<()> {
        let record = self.token_mut(token)?;
        if record.module_state(&module) != ModuleState::Initialized {
            return Err(LedgerError::InvalidModuleState {
                token,
                module,
                expected: "initialized".to_string(),
            });
        }
        record.modules.remove(&module);
        Ok(())
    }

    fn edit_default_position_unit(
        &mut self,
        token: Address,
        component: Address,
        real_unit: U256,
    ) -> LedgerResult<()> {
        let record = self.token_mut(token)?;
        let virtual_unit = convert_real_to_virtual(record.position_multiplier, real_unit)?;
        record.set_virtual_unit(component, virtual_unit);
        Ok(())
    }

    fn balance_of(&self, asset: Address, holder: Address) -> U256 {
        self.balances
            .get(&(asset, holder))
            .copied()
            .unwrap_or_default()
    }

    fn invoke_approve(
        &mut self,
        token: Address,
        asset: Address,
        spender: Address,
        quantity: U256,
    ) -> LedgerResult<()> {
        self.token(token)?;
        self.allowances.insert((asset, token, spender), quantity);
        Ok(())
    }

    fn invoke_transfer(
        &mut self,
        token: Address,
        asset: Address,
        to: Address,
        quantity: U256,
    ) -> LedgerResult<()> {
        self.token(token)?;
        self.transfer(asset, token, to, quantity)
    }

    fn invoke(&mut self, token: Address, call: &TradeCall) -> LedgerResult<Bytes> {
        self.token(token)?;
        let venue = self
            .venues
            .get(&call.target)
            .cloned()
            .ok_or(LedgerError::UnknownCallTarget(call.target))?;
        let order = SwapCalldata::decode(&call.calldata)?.into_order();
        let amount_out = self.execute_swap(&venue, token, &order)?;
        Ok(Bytes::from(amount_out.to_be_bytes::<32>().to_vec()))
    }

    fn static_invoke(&self, token: Address, call: &TradeCall) -> LedgerResult<Bytes> {
        self.clone().invoke(token, call)
    }
}

/// Real unit to the stored virtual unit; a non-zero real unit must not
/// vanish under the multiplier
fn convert_real_to_virtual(
    multiplier: PositionMultiplier,
    real_unit: U256,
) -> LedgerResult<U256> {
    let virtual_unit = multiplier.virtual_unit(real_unit)?;
    if !real_unit.is_zero() && virtual_unit.is_zero() {
        return Err(LedgerError::InvalidUnitConversion);
    }
    Ok(virtual_unit)
}
