use basket_core::{Address, Bytes, U256};
use std::sync::Arc;

use crate::error::{AdapterError, AdapterResult};

/// Swap requested from an exchange adapter
///
/// Exactly one leg is fixed. When `is_source_fixed`, `source_quantity` is sold
/// exactly and `destination_quantity` is the minimum to receive; otherwise
/// `destination_quantity` is bought exactly and `source_quantity` is the most
/// that may be spent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRequest {
    pub source_token: Address,
    pub destination_token: Address,
    /// Account receiving the destination token (the index token's custody)
    pub destination_address: Address,
    pub is_source_fixed: bool,
    pub source_quantity: U256,
    pub destination_quantity: U256,
    /// Venue-specific data configured by the manager, passed through untouched
    pub data: Bytes,
}

/// Call the index token must invoke to perform a swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeCall {
    pub target: Address,
    pub value: U256,
    pub calldata: Bytes,
}

/// Venue-specific calldata builder
pub trait ExchangeAdapter: Send + Sync {
    /// On-ledger identity of the adapter (reported in trade records)
    fn address(&self) -> Address;

    /// Account that must be approved to pull the source token
    fn spender(&self) -> Address;

    /// Translate a swap request into the venue's calldata
    fn build_trade(&self, request: &TradeRequest) -> AdapterResult<TradeCall>;

    /// Destination amount delivered, read from the venue's return data.
    /// Venues returning a single big-endian 256-bit word need no override.
    fn decode_amount_received(&self, output: &[u8]) -> AdapterResult<U256> {
        let word: [u8; 32] = output.try_into().map_err(|_| {
            AdapterError::InvalidOutput(format!("expected 32 bytes, got {}", output.len()))
        })?;
        Ok(U256::from_be_bytes(word))
    }
}

/// Integration registry: resolves a symbolic exchange name for a module
pub trait AdapterResolver: Send + Sync {
    fn resolve(&self, module: Address, name: &str) -> Option<Arc<dyn ExchangeAdapter>>;

    fn is_valid_adapter(&self, module: Address, name: &str) -> bool {
        self.resolve(module, name).is_some()
    }
}
