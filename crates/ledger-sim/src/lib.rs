//! Ledger Simulation
//!
//! In-memory stand-ins for every collaborator of the rebalancing engine:
//!
//! - [`SimLedger`]: index tokens (units, supply, multiplier, module states),
//!   custody balances and allowances, issuance, redemption and streaming-fee
//!   dilution; implements [`basket_ports::IndexLedger`]
//! - [`SimExchange`]: fixed-price venue settled through the ledger
//! - [`SimExchangeAdapter`]: builds `bincode` swap calldata for the venue
//! - [`SimController`]: enabled tokens, module fees, fee recipient
//! - [`IntegrationRegistry`]: resolves exchange names to adapters

mod adapter;
mod codec;
mod controller;
mod error;
mod exchange;
mod ledger;
mod registry;
mod token;

pub use adapter::SimExchangeAdapter;
pub use codec::{SwapCalldata, SwapOrder};
pub use controller::SimController;
pub use error::{VenueError, VenueResult};
pub use exchange::SimExchange;
pub use ledger::SimLedger;
pub use registry::IntegrationRegistry;
pub use token::SimIndexToken;
