//! Basket Runner - Multi-Trader Rebalance Simulation
//!
//! Drives the rebalancing engine the way a chain would:
//!
//! - **Bootstrap**: Index token, venue and module setup from configuration
//! - **Agents**: Trader agents picking trades from each block's header
//! - **Supply Feed**: Issuance, redemption and streaming-fee dilution
//! - **Host**: Atomic application of each transaction (snapshot/rollback)
//! - **Simulation**: Block sequencing and results
//!
//! ## Architecture
//!
//! ```text
//!                      ┌──────────────────────┐
//!                      │      Sequencer       │
//!                      │  (one block at a     │
//!                      │   time, BlockClock)  │
//!                      └──┬────────────────▲──┘
//!              headers    │                │  submissions
//!          (pending trades)                │  (priority fee)
//!         ┌───────────────┼──────────┐     │
//!         ▼               ▼          ▼     │
//!  ┌────────────┐  ┌────────────┐  ┌─────────────┐
//!  │ trader-0   │  │ trader-N   │  │ Supply Feed │
//!  └─────┬──────┘  └─────┬──────┘  └──────┬──────┘
//!        └───────────────┴────────────────┘
//!                        │
//!                        ▼
//!          ┌──────────────────────────────┐
//!          │ Host: snapshot ─► apply ─►   │
//!          │ commit or roll back          │
//!          │  RebalanceModule + SimLedger │
//!          └──────────────────────────────┘
//! ```

pub mod agent;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod event_feed;
pub mod host;
pub mod simulation;

// Re-export main types
pub use agent::{AgentConfig, AgentStats, BlockHeader, TraderAgent, TxReceipt};
pub use bootstrap::{Asset, AssetBook, Roles, SimulationBootstrap, TraderAccount, VENUE_NAME};
pub use config::{ComponentConfig, ReserveConfig, SimulationConfig, SupplyFeedConfig, TraderConfig};
pub use error::{Result, SimulationError};
pub use event_feed::SupplyFeed;
pub use host::{Action, ComponentStatus, Effect, RebalanceHost, Transaction};
pub use simulation::{ComponentReport, RebalanceSimulation, SimulationResults};
