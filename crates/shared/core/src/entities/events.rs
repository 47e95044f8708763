use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::values::{PositionMultiplier, Timestamp};

/// Records emitted by the rebalancing module, one per state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleEvent {
    RebalanceStarted {
        token: Address,
        components: Vec<Address>,
        target_units: Vec<U256>,
        position_multiplier: PositionMultiplier,
    },
    TradeMaximumUpdated {
        token: Address,
        component: Address,
        max_size: U256,
    },
    AssetExchangeUpdated {
        token: Address,
        component: Address,
        exchange_name: String,
    },
    ExchangeDataUpdated {
        token: Address,
        component: Address,
        exchange_data: Bytes,
    },
    CoolOffPeriodUpdated {
        token: Address,
        component: Address,
        cool_off_seconds: i64,
    },
    RaiseTargetPercentageUpdated {
        token: Address,
        raise_target_percentage: U256,
    },
    AssetTargetsRaised {
        token: Address,
        position_multiplier: PositionMultiplier,
    },
    AnyoneTradeUpdated {
        token: Address,
        status: bool,
    },
    TraderStatusUpdated {
        token: Address,
        trader: Address,
        status: bool,
    },
    TradeExecuted {
        token: Address,
        sell_component: Address,
        buy_component: Address,
        exchange_adapter: Address,
        executor: Address,
        net_amount_sold: U256,
        net_amount_received: U256,
        protocol_fee: U256,
        timestamp: Timestamp,
    },
}

impl ModuleEvent {
    /// Index token the event concerns
    pub fn token(&self) -> Address {
        match self {
            ModuleEvent::RebalanceStarted { token, .. }
            | ModuleEvent::TradeMaximumUpdated { token, .. }
            | ModuleEvent::AssetExchangeUpdated { token, .. }
            | ModuleEvent::ExchangeDataUpdated { token, .. }
            | ModuleEvent::CoolOffPeriodUpdated { token, .. }
            | ModuleEvent::RaiseTargetPercentageUpdated { token, .. }
            | ModuleEvent::AssetTargetsRaised { token, .. }
            | ModuleEvent::AnyoneTradeUpdated { token, .. }
            | ModuleEvent::TraderStatusUpdated { token, .. }
            | ModuleEvent::TradeExecuted { token, .. } => *token,
        }
    }
}
