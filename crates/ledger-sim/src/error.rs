use basket_core::{Address, MathError, U256};
use basket_ports::{AdapterError, LedgerError};
use thiserror::Error;

/// Reasons a simulated venue rejects a swap
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VenueError {
    #[error("Malformed calldata: {0}")]
    Decode(String),

    #[error("No price for asset {0}")]
    UnlistedAsset(Address),

    #[error("Output {out} below minimum {min_out}")]
    MinimumOutputNotMet { out: U256, min_out: U256 },

    #[error("Input {amount_in} above maximum {max_in}")]
    MaximumInputExceeded { amount_in: U256, max_in: U256 },

    #[error("Venue inventory of {asset} too low: needed {needed}, available {available}")]
    InsufficientInventory {
        asset: Address,
        needed: U256,
        available: U256,
    },

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

pub type VenueResult<T> = std::result::Result<T, VenueError>;

impl From<bincode::Error> for VenueError {
    fn from(e: bincode::Error) -> Self {
        VenueError::Decode(e.to_string())
    }
}

/// A venue rejection surfaces to the caller as a reverted call
impl From<VenueError> for LedgerError {
    fn from(e: VenueError) -> Self {
        LedgerError::CallReverted(e.to_string())
    }
}

impl From<VenueError> for AdapterError {
    fn from(e: VenueError) -> Self {
        AdapterError::Encoding(e.to_string())
    }
}
