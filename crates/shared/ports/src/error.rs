use basket_core::{Address, MathError, U256};
use thiserror::Error;

/// Failures raised by the index-token ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unknown index token: {0}")]
    UnknownToken(Address),

    #[error("Insufficient balance of {asset} held by {holder}: needed {needed}, available {available}")]
    InsufficientBalance {
        asset: Address,
        holder: Address,
        needed: U256,
        available: U256,
    },

    #[error("Insufficient allowance of {asset} from {owner} to {spender}: needed {needed}, approved {approved}")]
    InsufficientAllowance {
        asset: Address,
        owner: Address,
        spender: Address,
        needed: U256,
        approved: U256,
    },

    #[error("Unknown call target: {0}")]
    UnknownCallTarget(Address),

    #[error("Call reverted: {0}")]
    CallReverted(String),

    #[error("Module {module} is not {expected} on {token}")]
    InvalidModuleState {
        token: Address,
        module: Address,
        expected: String,
    },

    #[error("Real to virtual unit conversion invalid")]
    InvalidUnitConversion,

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Failures raised while building exchange calldata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Unsupported trade: {0}")]
    UnsupportedTrade(String),

    #[error("Invalid exchange data: {0}")]
    InvalidExchangeData(String),

    #[error("Calldata encoding failed: {0}")]
    Encoding(String),

    #[error("Undecodable trade output: {0}")]
    InvalidOutput(String),
}

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;
