//! Module instance, per-token registry and lifecycle

use basket_core::{
    Address, CallContext, ExecutionInfo, ModuleEvent, ModuleState, PermissionInfo,
    PositionMultiplier, RebalanceInfo, U256,
};
use basket_ports::{AdapterResolver, Clock, Controller, IndexLedger};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ModuleConfig;
use crate::error::{RebalanceError, Result};

/// Everything the module tracks for one index token
#[derive(Debug, Clone, Default)]
pub(crate) struct IndexState {
    pub execution: HashMap<Address, ExecutionInfo>,
    pub rebalance: RebalanceInfo,
    pub permissions: PermissionInfo,
}

/// The rebalancing module
///
/// Holds per-index-token state in an explicit registry. Every operation takes
/// the ledger it acts on; the module's own state is only written once every
/// fallible step of the call has succeeded.
#[derive(Clone)]
pub struct RebalanceModule {
    pub(crate) config: ModuleConfig,
    pub(crate) controller: Arc<dyn Controller>,
    pub(crate) integrations: Arc<dyn AdapterResolver>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) registry: HashMap<Address, IndexState>,
    events: Vec<ModuleEvent>,
}

impl RebalanceModule {
    pub fn new(
        config: ModuleConfig,
        controller: Arc<dyn Controller>,
        integrations: Arc<dyn AdapterResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            controller,
            integrations,
            clock,
            registry: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.config.module
    }

    pub fn reserve_asset(&self) -> Address {
        self.config.reserve_asset
    }

    /// Drain the records emitted since the last call
    pub fn take_events(&mut self) -> Vec<ModuleEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: ModuleEvent) {
        self.events.push(event);
    }

    /// Attach to a token on which this module is pending.
    ///
    /// Seeds every held component's target with its current real unit, so
    /// nothing is tradeable until a rebalance is declared.
    pub fn initialize<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        ctx: CallContext,
        token: Address,
    ) -> Result<()> {
        self.ensure_manager(ledger, ctx, token)?;
        if !self.controller.is_index_token(token) {
            return Err(RebalanceError::InvalidToken);
        }
        if ledger.module_state(token, self.config.module)? != ModuleState::Pending {
            return Err(RebalanceError::NotPendingInitialization);
        }

        let mut state = IndexState::default();
        for component in ledger.components(token)? {
            if ledger.has_external_position(token, component)? {
                return Err(RebalanceError::ExternalPosition(component));
            }
            let unit = ledger.default_position_real_unit(token, component)?;
            state.execution.insert(
                component,
                ExecutionInfo {
                    target_unit: unit,
                    ..Default::default()
                },
            );
        }

        ledger.initialize_module(token, self.config.module)?;
        self.registry.insert(token, state);

        info!(
            "[REBALANCE] Module initialized: token={}, components={}",
            token,
            self.registry.get(&token).map_or(0, |s| s.execution.len())
        );
        Ok(())
    }

    /// Detach from a token, discarding all of its execution, rebalance and
    /// permission state
    pub fn remove_module<L: IndexLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        ctx: CallContext,
        token: Address,
    ) -> Result<()> {
        self.ensure_manager(ledger, ctx, token)?;
        ledger.remove_module(token, self.config.module)?;
        self.registry.remove(&token);

        info!("[REBALANCE] Module removed: token={}", token);
        Ok(())
    }

    // ========================================================================
    // Read-only queries
    // ========================================================================

    /// Components under the active rebalance (empty if none)
    pub fn rebalance_components(&self, token: Address) -> Vec<Address> {
        self.registry
            .get(&token)
            .map(|s| s.rebalance.components.clone())
            .unwrap_or_default()
    }

    pub fn execution_info(&self, token: Address, component: Address) -> Option<&ExecutionInfo> {
        self.registry.get(&token)?.execution.get(&component)
    }

    pub fn rebalance_info(&self, token: Address) -> Option<&RebalanceInfo> {
        self.registry.get(&token).map(|s| &s.rebalance)
    }

    pub fn is_tracking(&self, token: Address) -> bool {
        self.registry.contains_key(&token)
    }

    // ========================================================================
    // Shared guards
    // ========================================================================

    pub(crate) fn ensure_manager<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        ctx: CallContext,
        token: Address,
    ) -> Result<()> {
        if ledger.manager(token)? != ctx.sender {
            return Err(RebalanceError::NotManager);
        }
        Ok(())
    }

    /// Controller-enabled token with this module initialized
    pub(crate) fn ensure_valid_token<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        token: Address,
    ) -> Result<()> {
        if !self.controller.is_index_token(token)
            || !self.registry.contains_key(&token)
            || ledger.module_state(token, self.config.module)? != ModuleState::Initialized
        {
            return Err(RebalanceError::InvalidToken);
        }
        Ok(())
    }

    /// Manager-only operations on a valid token
    pub(crate) fn ensure_manager_and_valid_token<L: IndexLedger + ?Sized>(
        &self,
        ledger: &L,
        ctx: CallContext,
        token: Address,
    ) -> Result<()> {
        self.ensure_manager(ledger, ctx, token)?;
        self.ensure_valid_token(ledger, token)
    }

    pub(crate) fn state(&self, token: Address) -> Result<&IndexState> {
        self.registry.get(&token).ok_or(RebalanceError::InvalidToken)
    }

    pub(crate) fn state_mut(&mut self, token: Address) -> Result<&mut IndexState> {
        self.registry
            .get_mut(&token)
            .ok_or(RebalanceError::InvalidToken)
    }

    /// Snapshot multiplier of the active rebalance
    pub(crate) fn snapshot_multiplier(&self, token: Address) -> Result<PositionMultiplier> {
        let rebalance = &self.state(token)?.rebalance;
        if !rebalance.is_active() {
            return Err(RebalanceError::NoActiveRebalance);
        }
        Ok(rebalance.position_multiplier)
    }

    /// Target unit as recorded (zero when the component has no entry)
    pub(crate) fn recorded_target(&self, token: Address, component: Address) -> U256 {
        self.execution_info(token, component)
            .map_or(U256::ZERO, |e| e.target_unit)
    }
}

impl std::fmt::Debug for RebalanceModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebalanceModule")
            .field("config", &self.config)
            .field("tokens", &self.registry.len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}
