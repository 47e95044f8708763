//! Basket Ports
//!
//! Port definitions (traits) for the basket rebalancing engine.
//! These define the boundaries between the engine and its collaborators:
//! the index-token ledger that holds custody, the protocol controller, the
//! integration registry and the exchange adapters it resolves, and time.

mod clock;
mod controller;
mod error;
mod integration;
mod ledger;

pub use clock::Clock;
pub use controller::Controller;
pub use error::{AdapterError, AdapterResult, LedgerError, LedgerResult};
pub use integration::{AdapterResolver, ExchangeAdapter, TradeCall, TradeRequest};
pub use ledger::IndexLedger;
