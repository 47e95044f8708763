use basket_core::Address;
use serde::{Deserialize, Serialize};

/// Fee slot the controller registers for this module's trade action
pub const DEFAULT_PROTOCOL_FEE_INDEX: usize = 0;

/// Static wiring of one rebalancing module instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// This module's own address (used for adapter lookup and fee lookup)
    pub module: Address,
    /// Counter-leg of every component trade (wrapped native currency)
    pub reserve_asset: Address,
    pub protocol_fee_index: usize,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            module: Address::ZERO,
            reserve_asset: Address::ZERO,
            protocol_fee_index: DEFAULT_PROTOCOL_FEE_INDEX,
        }
    }
}

impl ModuleConfig {
    pub fn new(module: Address, reserve_asset: Address) -> Self {
        Self {
            module,
            reserve_asset,
            ..Default::default()
        }
    }

    /// Read the trade fee from another controller slot
    pub fn with_protocol_fee_index(mut self, index: usize) -> Self {
        self.protocol_fee_index = index;
        self
    }
}
