//! Simulation configuration
//!
//! Human-readable quantities (`Decimal`) loaded from JSON. Bootstrap converts
//! them to ledger base units.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SimulationError};

/// One tradeable component of the index token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub symbol: String,
    pub decimals: u32,
    /// Reserve asset paid for one whole token
    pub price: Decimal,
    /// Units held per index token at start; zero for a component the
    /// rebalance introduces
    pub unit: Decimal,
    /// Units per index token once the rebalance completes
    pub target: Decimal,
    /// Largest quantity moved in one trade
    pub max_trade_size: Decimal,
    #[serde(default)]
    pub cool_off_secs: i64,
    /// Venue inventory available to buyers
    pub venue_inventory: Decimal,
}

impl ComponentConfig {
    pub fn new(symbol: &str, decimals: u32, price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
            price,
            unit: Decimal::ZERO,
            target: Decimal::ZERO,
            max_trade_size: Decimal::ZERO,
            cool_off_secs: 0,
            venue_inventory: Decimal::ZERO,
        }
    }

    pub fn with_units(mut self, unit: Decimal, target: Decimal) -> Self {
        self.unit = unit;
        self.target = target;
        self
    }

    pub fn with_max_trade_size(mut self, max_trade_size: Decimal) -> Self {
        self.max_trade_size = max_trade_size;
        self
    }

    pub fn with_cool_off_secs(mut self, cool_off_secs: i64) -> Self {
        self.cool_off_secs = cool_off_secs;
        self
    }

    pub fn with_venue_inventory(mut self, venue_inventory: Decimal) -> Self {
        self.venue_inventory = venue_inventory;
        self
    }
}

/// Reserve asset every component trades against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReserveConfig {
    pub symbol: String,
    /// Units held per index token at start
    pub unit: Decimal,
    /// Units to keep once the rebalance completes
    pub target: Decimal,
    pub venue_inventory: Decimal,
    /// Held by the issuer so issuance keeps working once the reserve
    /// becomes a position
    pub issuer_inventory: Decimal,
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            symbol: "WETH".to_string(),
            unit: Decimal::ZERO,
            target: Decimal::ZERO,
            venue_inventory: dec!(1000),
            issuer_inventory: dec!(100),
        }
    }
}

/// Trader agent behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraderConfig {
    pub count: usize,
    /// Chance per block that a trader submits anything
    pub activity: f64,
    /// Chance that a submission is a reserve sweep instead of a trade
    pub sweep_probability: f64,
    /// Most reserve a trader lets one buy spend
    pub buy_reserve_limit: Decimal,
    /// Upper bound of the random priority fee attached to each transaction
    pub max_priority_fee: u64,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            count: 3,
            activity: 0.8,
            sweep_probability: 0.1,
            buy_reserve_limit: dec!(100),
            max_priority_fee: 100,
        }
    }
}

/// Supply changes injected while the rebalance runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyFeedConfig {
    pub enabled: bool,
    /// Streaming fee inflation accrued every `fee_interval_blocks`
    pub streaming_fee: Decimal,
    pub fee_interval_blocks: u64,
    /// Chance per block of an issuance or redemption
    pub issuance_probability: f64,
    /// Largest index-token quantity issued or redeemed at once
    pub max_issuance: Decimal,
}

impl Default for SupplyFeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            streaming_fee: dec!(0.0001),
            fee_interval_blocks: 5,
            issuance_probability: 0.2,
            max_issuance: dec!(1),
        }
    }
}

/// Full simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub reserve: ReserveConfig,
    pub components: Vec<ComponentConfig>,
    /// Index tokens issued before the rebalance starts
    pub initial_supply: Decimal,
    /// Protocol fee charged on every trade
    pub protocol_fee: Decimal,
    /// Percentage applied by each target raise; `None` disables raising
    pub raise_target_percentage: Option<Decimal>,
    pub max_raises: u32,
    /// Public trading instead of an allow-list
    pub anyone_trade: bool,
    pub traders: TraderConfig,
    pub supply_feed: SupplyFeedConfig,
    pub block_time_secs: i64,
    /// Hard stop when targets are never met
    pub max_blocks: u64,
    /// Time the sequencer waits for participants before sealing a block
    pub block_window_ms: u64,
    /// Seed for every random decision; each participant derives its own
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            reserve: ReserveConfig::default(),
            components: vec![
                ComponentConfig::new("UNI", 18, dec!(0.01))
                    .with_units(dec!(86.9565217), dec!(60.869565780223716593))
                    .with_max_trade_size(dec!(100))
                    .with_cool_off_secs(60)
                    .with_venue_inventory(dec!(1000000)),
                ComponentConfig::new("WBTC", 8, dec!(15))
                    .with_units(dec!(0.01111111), dec!(0.02))
                    .with_max_trade_size(dec!(0.03))
                    .with_cool_off_secs(60)
                    .with_venue_inventory(dec!(10000)),
                ComponentConfig::new("DAI", 18, dec!(0.0005))
                    .with_units(dec!(100), dec!(50))
                    .with_max_trade_size(dec!(200))
                    .with_cool_off_secs(60)
                    .with_venue_inventory(dec!(1000000)),
            ],
            initial_supply: dec!(10),
            protocol_fee: Decimal::ZERO,
            raise_target_percentage: Some(dec!(0.0025)),
            max_raises: 2,
            anyone_trade: false,
            traders: TraderConfig::default(),
            supply_feed: SupplyFeedConfig::default(),
            block_time_secs: 12,
            max_blocks: 500,
            block_window_ms: 50,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| SimulationError::ConfigIo {
                path: path.as_ref().display().to_string(),
                error: e.to_string(),
            })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SimulationError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SimulationError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.components.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "at least one component is required".to_string(),
            ));
        }
        if self.initial_supply <= Decimal::ZERO {
            return Err(SimulationError::InvalidConfig(
                "initial supply must be positive".to_string(),
            ));
        }
        if self.protocol_fee < Decimal::ZERO || self.protocol_fee >= Decimal::ONE {
            return Err(SimulationError::InvalidConfig(
                "protocol fee must be in [0, 1)".to_string(),
            ));
        }
        if self
            .raise_target_percentage
            .is_some_and(|p| p <= Decimal::ZERO)
        {
            return Err(SimulationError::InvalidConfig(
                "raise target percentage must be positive".to_string(),
            ));
        }
        let mut symbols: Vec<&str> = self.components.iter().map(|c| c.symbol.as_str()).collect();
        symbols.push(&self.reserve.symbol);
        symbols.sort_unstable();
        if symbols.windows(2).any(|w| w[0] == w[1]) {
            return Err(SimulationError::InvalidConfig(
                "asset symbols must be unique".to_string(),
            ));
        }
        let probabilities = [
            self.traders.activity,
            self.traders.sweep_probability,
            self.supply_feed.issuance_probability,
        ];
        if probabilities.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(SimulationError::InvalidConfig(
                "probabilities must be in [0, 1]".to_string(),
            ));
        }
        if let Some(c) = self.components.iter().find(|c| c.decimals > 18) {
            return Err(SimulationError::InvalidConfig(format!(
                "{} has more than 18 decimals",
                c.symbol
            )));
        }
        Ok(())
    }
}
