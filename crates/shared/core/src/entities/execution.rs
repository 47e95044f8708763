use alloy_primitives::{Bytes, U256};
use chrono::{DateTime, Duration, Utc};

use crate::values::Timestamp;

/// Per-component trade execution parameters for one index token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionInfo {
    /// Desired real unit once the rebalance completes, denominated at the
    /// multiplier snapshot taken when the rebalance was declared
    pub target_unit: U256,

    /// Maximum component quantity traded in one call
    pub max_size: U256,

    /// Symbolic name resolved to an exchange adapter
    pub exchange_name: String,

    /// Opaque data handed to the adapter unmodified
    pub exchange_data: Bytes,

    /// Minimum time between trades touching this component
    pub cool_off_period: Duration,

    pub last_trade_timestamp: Timestamp,
}

impl Default for ExecutionInfo {
    fn default() -> Self {
        Self {
            target_unit: U256::ZERO,
            max_size: U256::ZERO,
            exchange_name: String::new(),
            exchange_data: Bytes::new(),
            cool_off_period: Duration::zero(),
            last_trade_timestamp: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl ExecutionInfo {
    /// Whether the cool-off window since the last trade has elapsed at `now`
    pub fn cool_off_elapsed(&self, now: Timestamp) -> bool {
        match self
            .last_trade_timestamp
            .checked_add_signed(self.cool_off_period)
        {
            Some(ready_at) => ready_at <= now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cool_off_window() {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let info = ExecutionInfo {
            cool_off_period: Duration::minutes(5),
            last_trade_timestamp: start,
            ..Default::default()
        };

        assert!(!info.cool_off_elapsed(start));
        assert!(!info.cool_off_elapsed(start + Duration::seconds(299)));
        assert!(info.cool_off_elapsed(start + Duration::minutes(5)));
    }

    #[test]
    fn test_never_traded_component_is_ready() {
        let info = ExecutionInfo {
            cool_off_period: Duration::hours(1),
            ..Default::default()
        };
        assert!(info.cool_off_elapsed(DateTime::<Utc>::from_timestamp(3_600, 0).unwrap()));
    }
}
