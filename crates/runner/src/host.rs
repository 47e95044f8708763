//! Transaction host
//!
//! Owns the engine and the ledger it acts on, and applies each sequenced
//! transaction atomically: both are snapshotted first and restored if the
//! transaction fails, so a failure is never partially applied.

use basket_core::{Address, CallContext, ModuleEvent, PositionMultiplier, U256, normalize_unit};
use basket_ports::IndexLedger;
use basket_rebalance::{ComponentTrade, RebalanceModule, TradeReceipt};
use ledger_sim::SimLedger;
use log::{debug, warn};
use uuid::Uuid;

use crate::error::Result;

/// What a transaction asks the host to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Trade {
        component: Address,
        reserve_limit: U256,
    },
    TradeRemainingReserve {
        component: Address,
        min_component_received: U256,
    },
    RaiseTargets,
    Issue {
        quantity: U256,
    },
    Redeem {
        quantity: U256,
    },
    AccrueStreamingFee {
        inflation: U256,
    },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Trade { .. } => "trade",
            Action::TradeRemainingReserve { .. } => "trade_remaining_reserve",
            Action::RaiseTargets => "raise_targets",
            Action::Issue { .. } => "issue",
            Action::Redeem { .. } => "redeem",
            Action::AccrueStreamingFee { .. } => "accrue_streaming_fee",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub ctx: CallContext,
    pub action: Action,
    /// Higher fees are sequenced first within a block
    pub priority_fee: u64,
}

impl Transaction {
    pub fn new(ctx: CallContext, action: Action, priority_fee: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            ctx,
            action,
            priority_fee,
        }
    }
}

/// Result of an applied transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Traded(TradeReceipt),
    TargetsRaised,
    SupplyChanged { total_supply: U256 },
    FeeAccrued { minted: U256 },
}

/// Unit of one component against its target at the live multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentStatus {
    pub component: Address,
    pub unit: U256,
    pub normalized_target: U256,
}

pub struct RebalanceHost {
    module: RebalanceModule,
    ledger: SimLedger,
    token: Address,
    fee_recipient: Address,
    events: Vec<ModuleEvent>,
}

impl RebalanceHost {
    pub fn new(
        module: RebalanceModule,
        ledger: SimLedger,
        token: Address,
        fee_recipient: Address,
    ) -> Self {
        Self {
            module,
            ledger,
            token,
            fee_recipient,
            events: Vec::new(),
        }
    }

    pub fn module(&self) -> &RebalanceModule {
        &self.module
    }

    pub fn ledger(&self) -> &SimLedger {
        &self.ledger
    }

    pub fn token(&self) -> Address {
        self.token
    }

    /// Module events recorded by committed transactions
    pub fn events(&self) -> &[ModuleEvent] {
        &self.events
    }

    /// Apply `tx` atomically
    pub fn execute(&mut self, tx: &Transaction) -> Result<Effect> {
        let module_snapshot = self.module.clone();
        let ledger_snapshot = self.ledger.clone();

        match self.apply(tx) {
            Ok(effect) => {
                self.events.extend(self.module.take_events());
                debug!("[HOST] Committed {}: {}", tx.action.kind(), tx.id);
                Ok(effect)
            }
            Err(e) => {
                self.module = module_snapshot;
                self.ledger = ledger_snapshot;
                warn!("[HOST] Reverted {} {}: {}", tx.action.kind(), tx.id, e);
                Err(e)
            }
        }
    }

    fn apply(&mut self, tx: &Transaction) -> Result<Effect> {
        let token = self.token;
        let effect = match tx.action {
            Action::Trade {
                component,
                reserve_limit,
            } => Effect::Traded(self.module.trade(
                &mut self.ledger,
                tx.ctx,
                token,
                component,
                reserve_limit,
            )?),
            Action::TradeRemainingReserve {
                component,
                min_component_received,
            } => Effect::Traded(self.module.trade_remaining_weth(
                &mut self.ledger,
                tx.ctx,
                token,
                component,
                min_component_received,
            )?),
            Action::RaiseTargets => {
                self.module
                    .raise_asset_targets(&self.ledger, tx.ctx, token)?;
                Effect::TargetsRaised
            }
            Action::Issue { quantity } => {
                self.ledger.issue(token, tx.ctx.sender, quantity)?;
                Effect::SupplyChanged {
                    total_supply: self.ledger.total_supply(token)?,
                }
            }
            Action::Redeem { quantity } => {
                self.ledger.redeem(token, tx.ctx.sender, quantity)?;
                Effect::SupplyChanged {
                    total_supply: self.ledger.total_supply(token)?,
                }
            }
            Action::AccrueStreamingFee { inflation } => {
                let minted =
                    self.ledger
                        .accrue_streaming_fee(token, self.fee_recipient, inflation)?;
                Effect::FeeAccrued { minted }
            }
        };
        Ok(effect)
    }

    /// Trade each non-reserve rebalance component needs right now
    pub fn pending_trades(&self) -> Vec<(Address, ComponentTrade)> {
        let reserve = self.module.reserve_asset();
        self.module
            .rebalance_components(self.token)
            .into_iter()
            .filter(|c| *c != reserve)
            .filter_map(|c| {
                self.module
                    .component_trade_quantity_and_direction(&self.ledger, self.token, c)
                    .ok()
                    .map(|trade| (c, trade))
            })
            .collect()
    }

    pub fn all_targets_met(&self) -> Result<bool> {
        Ok(self.module.all_targets_met(&self.ledger, self.token)?)
    }

    pub fn component_status(&self, component: Address) -> Result<ComponentStatus> {
        let unit = self
            .ledger
            .default_position_real_unit(self.token, component)?;
        let live = self.ledger.position_multiplier(self.token)?;
        let normalized_target = match (
            self.module.rebalance_info(self.token),
            self.module.execution_info(self.token, component),
        ) {
            (Some(rebalance), Some(info)) if rebalance.is_active() => normalize_unit(
                info.target_unit,
                rebalance.position_multiplier,
                PositionMultiplier::from_raw(live),
            )?,
            _ => U256::ZERO,
        };
        Ok(ComponentStatus {
            component,
            unit,
            normalized_target,
        })
    }
}

impl std::fmt::Debug for RebalanceHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebalanceHost")
            .field("token", &self.token)
            .field("module", &self.module)
            .field("events", &self.events.len())
            .finish()
    }
}
