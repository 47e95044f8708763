use basket_core::MathError;
use basket_ports::LedgerError;
use basket_rebalance::RebalanceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Failed to read config {path}: {error}")]
    ConfigIo { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown asset symbol: {0}")]
    UnknownSymbol(String),

    #[error(transparent)]
    Rebalance(#[from] RebalanceError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error("Sequencer channel closed")]
    ChannelClosed,

    #[error("Task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
