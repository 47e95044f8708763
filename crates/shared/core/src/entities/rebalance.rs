use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::values::PositionMultiplier;

/// Active rebalance of one index token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceInfo {
    /// Components under rebalance: holdings at declaration time followed by
    /// newly introduced components. No duplicates.
    pub components: Vec<Address>,

    /// Ledger multiplier snapshotted at declaration; lowered by target raises.
    /// Zero until the first rebalance is declared.
    pub position_multiplier: PositionMultiplier,

    /// Percentage (18 decimals) applied by each target raise; zero disables it
    pub raise_target_percentage: U256,
}

impl RebalanceInfo {
    pub fn contains(&self, component: &Address) -> bool {
        self.components.contains(component)
    }

    pub fn is_active(&self) -> bool {
        !self.position_multiplier.is_zero()
    }
}
