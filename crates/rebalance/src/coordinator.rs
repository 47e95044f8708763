//! Rebalance Coordinator
//!
//! Declares targets, sizes trades against live ledger state and raises
//! targets once everything is met but reserve remains undeployed.
//!
//! Targets are recorded at the multiplier snapshotted when the rebalance was
//! declared. Before comparing with live units they are renormalised:
//!
//! ```text
//! normalized_target = target_unit × live_multiplier / snapshot_multiplier   (floor)
//! current_notional  = total_supply × real_unit / 1e18                       (floor)
//! target_notional   = total_supply × normalized_target / 1e18               (ceil)
//! ```

use basket_core::values::precise::{
    approximately_equals, checked_sub, precise_div, precise_mul, precise_mul_ceil,
};
use basket_core::{
    Address, CallContext, ModuleEvent, PRECISE_UNIT, PositionMultiplier, U256, normalize_unit,
};
use basket_ports::IndexLedger;
use log::{debug, info};

use crate::error::{RebalanceError, Result};
use crate::module::RebalanceModule;
use crate::validation::has_duplicate;

/// Direction and size of the trade that moves a component toward target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentTrade {
    pub is_selling: bool,
    /// Component notional, in base units
    pub quantity: U256,
}

/// Live position of one component measured against its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PositionReading {
    pub current_unit: U256,
    pub normalized_target: U256,
    pub current_notional: U256,
    pub target_notional: U256,
}

impl PositionReading {
    pub fn is_met(&self) -> bool {
        self.current_unit == self.normalized_target
    }

    pub fn is_selling(&self) -> bool {
        self.target_notional < self.current_notional
    }

    /// Absolute notional between current and target
    pub fn delta(&self) -> U256 {
        if self.is_selling() {
            self.current_notional - self.target_notional
        } else {
            self.target_notional - self.current_notional
        }
    }
}

impl RebalanceModule {
    /// Declare new targets for every held component plus any new ones.
    ///
    /// `old_component_target_units` must cover the ledger's current
    /// components one-for-one, in ledger order.
    #[allow(clippy::too_many_arguments)]
    pub fn start_rebalance<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &L,
        ctx: CallContext,
        token: Address,
        new_components: &[Address],
        new_component_target_units: &[U256],
        old_component_target_units: &[U256],
        position_multiplier: U256,
    ) -> Result<()> {
        self.ensure_manager_and_valid_token(ledger, ctx, token)?;

        if new_components.len() != new_component_target_units.len() {
            return Err(RebalanceError::ArrayLengthMismatch);
        }
        let current_components = ledger.components(token)?;
        if current_components.len() != old_component_target_units.len() {
            return Err(RebalanceError::OldComponentTargetsMissing);
        }

        let components: Vec<Address> = current_components
            .iter()
            .chain(new_components)
            .copied()
            .collect();
        let target_units: Vec<U256> = old_component_target_units
            .iter()
            .chain(new_component_target_units)
            .copied()
            .collect();
        if has_duplicate(&components) {
            return Err(RebalanceError::DuplicateComponents);
        }
        for component in &components {
            if ledger.has_external_position(token, *component)? {
                return Err(RebalanceError::ExternalPosition(*component));
            }
        }
        if position_multiplier.is_zero() {
            return Err(RebalanceError::InvalidPositionMultiplier);
        }

        let multiplier = PositionMultiplier::from_raw(position_multiplier);
        let state = self.state_mut(token)?;
        for (component, target) in components.iter().zip(&target_units) {
            state.execution.entry(*component).or_default().target_unit = *target;
        }
        state.rebalance.components = components.clone();
        state.rebalance.position_multiplier = multiplier;

        info!(
            "[REBALANCE] Rebalance started: token={}, components={}, multiplier={}",
            token,
            components.len(),
            multiplier
        );
        self.emit(ModuleEvent::RebalanceStarted {
            token,
            components,
            target_units,
            position_multiplier: multiplier,
        });
        Ok(())
    }

    /// Percentage applied by each `raise_asset_targets` call (18 decimals)
    pub fn set_raise_target_percentage<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &L,
        ctx: CallContext,
        token: Address,
        raise_target_percentage: U256,
    ) -> Result<()> {
        self.ensure_manager_and_valid_token(ledger, ctx, token)?;
        if raise_target_percentage.is_zero() {
            return Err(RebalanceError::InvalidRaiseTargetPercentage);
        }

        self.state_mut(token)?.rebalance.raise_target_percentage = raise_target_percentage;
        self.emit(ModuleEvent::RaiseTargetPercentageUpdated {
            token,
            raise_target_percentage,
        });
        Ok(())
    }

    /// Raise every effective target by the configured percentage.
    ///
    /// Only allowed once all non-reserve components sit on target and the
    /// reserve still holds more than its own target. Divides the snapshot
    /// multiplier by `1 + percentage`, which scales every normalised target up
    /// at once.
    pub fn raise_asset_targets<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &L,
        ctx: CallContext,
        token: Address,
    ) -> Result<()> {
        self.ensure_valid_token(ledger, token)?;
        self.ensure_allowed_trader(ctx, token)?;

        let snapshot = self.snapshot_multiplier(token)?;
        let percentage = self.state(token)?.rebalance.raise_target_percentage;
        if percentage.is_zero() {
            return Err(RebalanceError::RaiseTargetPercentageUnset);
        }

        let reserve = self.config.reserve_asset;
        if !self.all_targets_met(ledger, token)?
            || ledger.default_position_real_unit(token, reserve)?
                <= self.normalized_target_unit(ledger, token, reserve)?
        {
            return Err(RebalanceError::TargetsNotMet);
        }

        let raised = snapshot.shrink_by(percentage)?;
        self.state_mut(token)?.rebalance.position_multiplier = raised;

        info!(
            "[REBALANCE] Asset targets raised: token={}, multiplier={} -> {}",
            token, snapshot, raised
        );
        self.emit(ModuleEvent::AssetTargetsRaised {
            token,
            position_multiplier: raised,
        });
        Ok(())
    }

    /// Trade needed right now to move `component` toward its target.
    ///
    /// Pure read of ledger state. Reports a zero quantity once the live unit
    /// equals the normalised target.
    pub fn component_trade_quantity_and_direction<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        token: Address,
        component: Address,
    ) -> Result<ComponentTrade> {
        if component == self.config.reserve_asset {
            return Err(RebalanceError::CannotTradeReserve);
        }
        if !self.state(token)?.rebalance.contains(&component) {
            return Err(RebalanceError::ComponentNotRecognized(component));
        }

        let supply = ledger.total_supply(token)?;
        let reading = self.read_position(ledger, token, component, supply)?;
        if reading.is_met() {
            return Ok(ComponentTrade {
                is_selling: false,
                quantity: U256::ZERO,
            });
        }
        Ok(ComponentTrade {
            is_selling: reading.is_selling(),
            quantity: reading.delta(),
        })
    }

    // ========================================================================
    // Sizing internals
    // ========================================================================

    /// Recorded target re-expressed at the ledger's live multiplier
    pub(crate) fn normalized_target_unit<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        token: Address,
        component: Address,
    ) -> Result<U256> {
        let snapshot = self.snapshot_multiplier(token)?;
        let live = PositionMultiplier::from_raw(ledger.position_multiplier(token)?);
        Ok(normalize_unit(
            self.recorded_target(token, component),
            snapshot,
            live,
        )?)
    }

    pub(crate) fn read_position<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        token: Address,
        component: Address,
        total_supply: U256,
    ) -> Result<PositionReading> {
        let current_unit = ledger.default_position_real_unit(token, component)?;
        let normalized_target = self.normalized_target_unit(ledger, token, component)?;
        Ok(PositionReading {
            current_unit,
            normalized_target,
            current_notional: precise_mul(total_supply, current_unit)?,
            target_notional: precise_mul_ceil(total_supply, normalized_target)?,
        })
    }

    /// Executable size: the delta clamped to `max_size`. Buys are grossed up
    /// by `1 / (1 - fee)` so the amount kept after the protocol fee lands on
    /// target.
    pub(crate) fn trade_size_and_direction<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        token: Address,
        component: Address,
        total_supply: U256,
    ) -> Result<ComponentTrade> {
        let reading = self.read_position(ledger, token, component, total_supply)?;
        if reading.is_met() {
            return Err(RebalanceError::TargetAlreadyMet(component));
        }

        let max_size = self
            .execution_info(token, component)
            .map_or(U256::ZERO, |e| e.max_size);
        let is_selling = reading.is_selling();
        let raw = if is_selling {
            reading.delta()
        } else {
            let fee = self
                .controller
                .module_fee(self.config.module, self.config.protocol_fee_index);
            precise_div(reading.delta(), checked_sub(PRECISE_UNIT, fee)?)?
        };
        let quantity = raw.min(max_size);

        debug!(
            "[REBALANCE] Trade sized: component={}, selling={}, current={}, target={}, raw={}, clamped={}",
            component,
            is_selling,
            reading.current_notional,
            reading.target_notional,
            raw,
            quantity
        );

        if quantity.is_zero() {
            return Err(RebalanceError::TargetAlreadyMet(component));
        }
        Ok(ComponentTrade {
            is_selling,
            quantity,
        })
    }

    /// Every non-reserve rebalance component sits on its normalised target
    /// (within one unit when the target is non-zero)
    pub fn all_targets_met<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        token: Address,
    ) -> Result<bool> {
        for component in &self.state(token)?.rebalance.components {
            if *component == self.config.reserve_asset {
                continue;
            }
            let current = ledger.default_position_real_unit(token, *component)?;
            let target = self.normalized_target_unit(ledger, token, *component)?;
            let met = if target.is_zero() {
                current == target
            } else {
                approximately_equals(current, target, U256::from(1u64))
            };
            if !met {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// No non-reserve component is held above its normalised target
    pub(crate) fn no_tokens_to_sell<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        token: Address,
    ) -> Result<bool> {
        for component in &self.state(token)?.rebalance.components {
            if *component == self.config.reserve_asset {
                continue;
            }
            let target = self.normalized_target_unit(ledger, token, *component)?;
            if target < ledger.default_position_real_unit(token, *component)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
