//! Rebalancing engine errors

use basket_core::{Address, MathError};
use basket_ports::{AdapterError, LedgerError};
use thiserror::Error;

/// Every way a module call can abort. A failed call leaves no state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RebalanceError {
    // Authorization
    #[error("Must be the manager")]
    NotManager,

    #[error("Address not permitted to trade")]
    TraderNotPermitted,

    #[error("Caller must be EOA Address")]
    CallerNotEoa,

    // State preconditions
    #[error("Must be a valid and initialized index token")]
    InvalidToken,

    #[error("Must be pending initialization")]
    NotPendingInitialization,

    #[error("External positions not allowed")]
    ExternalPosition(Address),

    #[error("No active rebalance")]
    NoActiveRebalance,

    #[error("Component not recognized")]
    ComponentNotRecognized(Address),

    #[error("Component not part of rebalance")]
    ComponentNotInRebalance(Address),

    #[error("Can not explicitly trade WETH")]
    CannotTradeReserve,

    #[error("Component cool off in progress")]
    CoolOffInProgress(Address),

    #[error("Target already met")]
    TargetAlreadyMet(Address),

    #[error("Sell other set components first")]
    SellOtherComponentsFirst,

    #[error("WETH is below target unit")]
    ReserveBelowTarget,

    #[error("Targets not met or ETH =~ 0")]
    TargetsNotMet,

    #[error("Raise target percentage not set")]
    RaiseTargetPercentageUnset,

    // Input validation
    #[error("Array length mismatch")]
    ArrayLengthMismatch,

    #[error("Array length must be > 0")]
    EmptyArray,

    #[error("Cannot duplicate addresses")]
    DuplicateAddresses,

    #[error("Cannot duplicate components")]
    DuplicateComponents,

    #[error("Old component targets missing")]
    OldComponentTargetsMissing,

    #[error("Unrecognized exchange name")]
    UnrecognizedExchange(String),

    #[error("Must be valid adapter")]
    InvalidAdapter(String),

    #[error("Target percentage must be > 0")]
    InvalidRaiseTargetPercentage,

    #[error("Position multiplier must be > 0")]
    InvalidPositionMultiplier,

    // Execution
    #[error("Slippage limit exceeded")]
    SlippageExceeded,

    #[error("Trade amount > max trade size")]
    ExceedsMaxTradeSize,

    #[error("Can not exceed target unit")]
    ExceedsTargetUnit,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

pub type Result<T> = std::result::Result<T, RebalanceError>;
