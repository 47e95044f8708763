//! Basket Core Domain
//!
//! Pure domain types for the basket rebalancing engine.
//! This crate contains no async, no I/O, and is 100% unit testable.
//!
//! - [`values`]: ledger primitives, 18-decimal fixed point math and the
//!   position multiplier
//! - [`entities`]: per-index-token records kept by the rebalancing module
//!   (execution parameters, rebalance snapshot, trader permissions) and the
//!   events it records

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    CallContext, ExecutionInfo, ModuleEvent, ModuleState, PermissionInfo, RebalanceInfo,
    TraderAllowList,
};
pub use values::{
    Address, Bytes, MathError, MathResult, Notional, PRECISE_UNIT, PositionMultiplier, Timestamp,
    U256, Unit, normalize_unit,
};
