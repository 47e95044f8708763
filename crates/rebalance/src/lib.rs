//! Basket Rebalance Engine
//!
//! Moves an index token's component holdings from their current units to
//! manager-declared targets through a sequence of permissioned, rate-limited
//! trades against a reserve asset.
//!
//! ## Architecture
//!
//! ```text
//!                 manager                          traders
//!                    │                                │
//!      ┌─────────────┼────────────┐        ┌──────────┼───────────┐
//!      ▼             ▼            ▼        ▼          ▼           ▼
//!  initialize   set_* params  start_rebalance   trade   trade_remaining_weth
//!  remove_module      │            │              │          │
//!                     ▼            ▼              └────┬─────┘
//!          ┌──────────────────────────────┐           ▼
//!          │  Registry: token ─► state    │◄──  Permission Guard
//!          │  ExecutionInfo per component │           │
//!          │  RebalanceInfo (snapshot)    │──►  Coordinator (sizing)
//!          │  PermissionInfo              │           │
//!          └──────────────────────────────┘           ▼
//!                                          AdapterResolver ─► ExchangeAdapter
//!                                                     │
//!                                                     ▼
//!                                     IndexLedger (custody, units, supply)
//! ```
//!
//! The module never caches ledger state between calls: sizes are recomputed
//! from live supply, units and multiplier on every trade, so transactions
//! may arrive in any order.

mod config;
mod coordinator;
mod error;
mod executor;
mod module;
mod params;
mod permission;
mod position;
mod validation;

pub use config::{DEFAULT_PROTOCOL_FEE_INDEX, ModuleConfig};
pub use coordinator::ComponentTrade;
pub use error::{RebalanceError, Result};
pub use executor::TradeReceipt;
pub use module::RebalanceModule;
