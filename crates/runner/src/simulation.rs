//! Simulation - block sequencing over the rebalancing engine
//!
//! Ties together:
//! - The bootstrapped host (engine + simulated ledger)
//! - Trader agents and the supply feed
//! - A sequencer that seals one block at a time, orders its transactions by
//!   priority fee and applies each one atomically
//! - Target raises by the keeper once every component is on target

use basket_clock::{BlockClock, Clock};
use basket_core::values::precise::approximately_equals;
use basket_core::values::{from_base_units, to_base_units};
use basket_core::{CallContext, U256};
use basket_ports::IndexLedger;
use chrono::Duration;
use priority_queue::PriorityQueue;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::agent::{
    AgentConfig, AgentStats, BlockHeader, SequencerMessage, Submission, TraderAgent, TxReceipt,
};
use crate::bootstrap::{Asset, AssetBook, Roles, SimulationBootstrap, TraderAccount};
use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::event_feed::SupplyFeed;
use crate::host::{Action, Effect, RebalanceHost, Transaction};

const KEEPER_ID: &str = "keeper";

/// Final unit of one asset against its target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentReport {
    pub symbol: String,
    /// `None` when the value does not fit a `Decimal`
    pub unit: Option<Decimal>,
    pub target: Option<Decimal>,
    pub on_target: bool,
}

/// Simulation results
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationResults {
    pub blocks: u64,
    /// Transactions sequenced, committed or not
    pub transactions: u64,
    pub committed: u64,
    pub trades: u64,
    pub sweeps: u64,
    pub target_raises: u32,
    pub supply_changes: u64,
    /// Reverted transactions keyed by error message
    pub failures_by_reason: BTreeMap<String, u64>,
    pub trades_by_participant: BTreeMap<String, u64>,
    pub agents: BTreeMap<String, AgentStats>,
    pub components: Vec<ComponentReport>,
    /// Whether the run ended with every component on target
    pub targets_met: bool,
    pub final_supply: Option<Decimal>,
}

impl SimulationResults {
    pub fn failures(&self) -> u64 {
        self.failures_by_reason.values().sum()
    }

    fn record(&mut self, from: &str, tx: &Transaction, outcome: &Result<Effect>) {
        self.transactions += 1;
        match outcome {
            Ok(effect) => {
                self.committed += 1;
                match effect {
                    Effect::Traded(_) => {
                        if matches!(tx.action, Action::TradeRemainingReserve { .. }) {
                            self.sweeps += 1;
                        } else {
                            self.trades += 1;
                        }
                        *self
                            .trades_by_participant
                            .entry(from.to_string())
                            .or_insert(0) += 1;
                    }
                    Effect::TargetsRaised => self.target_raises += 1,
                    Effect::SupplyChanged { .. } | Effect::FeeAccrued { .. } => {
                        self.supply_changes += 1
                    }
                }
            }
            Err(e) => {
                *self.failures_by_reason.entry(e.to_string()).or_insert(0) += 1;
            }
        }
    }
}

/// Orders one block's submissions: highest priority fee first, arrival
/// order among equal fees
#[derive(Default)]
pub struct BlockBuilder {
    queue: PriorityQueue<u64, (u64, Reverse<u64>)>,
    submissions: HashMap<u64, Submission>,
    arrivals: u64,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, submission: Submission) {
        let arrival = self.arrivals;
        self.arrivals += 1;
        self.queue
            .push(arrival, (submission.transaction.priority_fee, Reverse(arrival)));
        self.submissions.insert(arrival, submission);
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    pub fn into_ordered(mut self) -> Vec<Submission> {
        let mut ordered = Vec::with_capacity(self.submissions.len());
        while let Some((arrival, _)) = self.queue.pop() {
            if let Some(submission) = self.submissions.remove(&arrival) {
                ordered.push(submission);
            }
        }
        ordered
    }
}

/// Gather submissions for `block` until every participant is done or the
/// window closes
async fn collect_block(
    rx: &mut mpsc::Receiver<SequencerMessage>,
    block: u64,
    participants: usize,
    window: std::time::Duration,
) -> BlockBuilder {
    let mut builder = BlockBuilder::new();
    let deadline = tokio::time::Instant::now() + window;
    let mut done = 0;

    while done < participants {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(SequencerMessage::Submit(submission))) => builder.push(submission),
            Ok(Some(SequencerMessage::Done { block: b, .. })) if b == block => done += 1,
            Ok(Some(SequencerMessage::Done { participant, block: b })) => {
                log::debug!(
                    "[SEQUENCER] Ignoring late done from {} for block {}",
                    participant,
                    b
                );
            }
            Ok(None) => break,
            Err(_) => {
                log::warn!(
                    "[SEQUENCER] Block {} sealed on timeout ({}/{} participants)",
                    block,
                    done,
                    participants
                );
                break;
            }
        }
    }
    builder
}

/// The reserve counts as on target while it holds at least its target
fn report(host: &RebalanceHost, asset: &Asset, is_reserve: bool) -> Result<ComponentReport> {
    let status = host.component_status(asset.address)?;
    let on_target = if is_reserve {
        status.unit >= status.normalized_target
    } else if status.normalized_target.is_zero() {
        status.unit.is_zero()
    } else {
        approximately_equals(status.unit, status.normalized_target, U256::from(1u64))
    };
    Ok(ComponentReport {
        symbol: asset.symbol.clone(),
        unit: from_base_units(status.unit, asset.decimals),
        target: from_base_units(status.normalized_target, asset.decimals),
        on_target,
    })
}

/// Full rebalance simulation
pub struct RebalanceSimulation {
    config: SimulationConfig,
    host: RebalanceHost,
    clock: Arc<BlockClock>,
    assets: AssetBook,
    roles: Roles,
    traders: Vec<TraderAccount>,
    header_tx: broadcast::Sender<BlockHeader>,
    message_tx: mpsc::Sender<SequencerMessage>,
    message_rx: mpsc::Receiver<SequencerMessage>,
}

impl RebalanceSimulation {
    /// Create a new simulation with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(SimulationConfig::default())
    }

    /// Create a new simulation with custom configuration
    pub fn with_config(config: SimulationConfig) -> Result<Self> {
        let bootstrap = SimulationBootstrap::new(&config)?;
        let (header_tx, _) = broadcast::channel(64);
        let (message_tx, message_rx) = mpsc::channel(1024);

        Ok(Self {
            config,
            host: bootstrap.host,
            clock: bootstrap.clock,
            assets: bootstrap.assets,
            roles: bootstrap.roles,
            traders: bootstrap.traders,
            header_tx,
            message_tx,
            message_rx,
        })
    }

    pub fn host(&self) -> &RebalanceHost {
        &self.host
    }

    pub fn assets(&self) -> &AssetBook {
        &self.assets
    }

    pub fn roles(&self) -> Roles {
        self.roles
    }

    fn spawn_agents(&self) -> Result<Vec<(String, JoinHandle<AgentStats>)>> {
        let traders = &self.config.traders;
        let buy_reserve_limit = to_base_units(traders.buy_reserve_limit, 18)?;

        Ok(self
            .traders
            .iter()
            .enumerate()
            .map(|(i, account)| {
                let config = AgentConfig {
                    agent_id: account.name.clone(),
                    account: account.address,
                    activity: traders.activity,
                    sweep_probability: traders.sweep_probability,
                    buy_reserve_limit,
                    max_priority_fee: traders.max_priority_fee,
                    seed: self.config.seed.wrapping_add(i as u64 + 1),
                };
                let agent = TraderAgent::new(
                    config,
                    self.header_tx.subscribe(),
                    self.message_tx.clone(),
                );
                (account.name.clone(), tokio::spawn(agent.run()))
            })
            .collect())
    }

    fn spawn_feed(&self) -> Result<Option<JoinHandle<Result<()>>>> {
        if !self.config.supply_feed.enabled {
            return Ok(None);
        }
        let feed = SupplyFeed::new(
            &self.config.supply_feed,
            self.roles.issuer,
            self.config.seed ^ 0x5eed,
            self.header_tx.subscribe(),
            self.message_tx.clone(),
        )?;
        Ok(Some(tokio::spawn(feed.run())))
    }

    /// Apply a sealed block and reply to every submitter
    fn apply_block(&mut self, block: u64, builder: BlockBuilder, results: &mut SimulationResults) {
        for submission in builder.into_ordered() {
            let outcome = self.host.execute(&submission.transaction);
            results.record(&submission.from, &submission.transaction, &outcome);
            let receipt = TxReceipt {
                id: submission.transaction.id,
                block,
                outcome: outcome.map_err(|e| e.to_string()),
            };
            // The submitter may have stopped listening
            let _ = submission.reply.send(receipt);
        }
    }

    /// Once every component is on target: raise targets if any raises are
    /// left, otherwise stop. Returns whether the run is finished.
    fn settle(&mut self, raises: &mut u32, results: &mut SimulationResults) -> Result<bool> {
        if !self.host.all_targets_met()? {
            return Ok(false);
        }
        if self.config.raise_target_percentage.is_none() || *raises >= self.config.max_raises {
            return Ok(true);
        }

        let tx = Transaction::new(CallContext::eoa(self.roles.keeper), Action::RaiseTargets, 0);
        let outcome = self.host.execute(&tx);
        let raised = outcome.is_ok();
        results.record(KEEPER_ID, &tx, &outcome);
        if raised {
            *raises += 1;
            log::info!("[SEQUENCER] Targets raised ({}/{})", raises, self.config.max_raises);
        }
        Ok(!raised)
    }

    /// Run the full simulation
    pub async fn run(mut self) -> Result<SimulationResults> {
        log::info!("Starting rebalance simulation...");

        let agent_handles = self.spawn_agents()?;
        let feed_handle = self.spawn_feed()?;
        let participants = agent_handles.len() + usize::from(feed_handle.is_some());
        let window = std::time::Duration::from_millis(self.config.block_window_ms);

        let mut results = SimulationResults::default();
        let mut raises = 0;
        let mut finished = false;

        while !finished && results.blocks < self.config.max_blocks {
            let number = self
                .clock
                .mine(Duration::seconds(self.config.block_time_secs));
            results.blocks += 1;

            let header = BlockHeader {
                number,
                timestamp: self.clock.now(),
                pending_trades: self.host.pending_trades(),
            };
            if self.header_tx.send(header).is_err() && participants > 0 {
                return Err(SimulationError::ChannelClosed);
            }

            let builder = collect_block(&mut self.message_rx, number, participants, window).await;
            log::debug!("[SEQUENCER] Block {}: {} transactions", number, builder.len());
            self.apply_block(number, builder, &mut results);

            finished = self.settle(&mut raises, &mut results)?;
        }

        // Closing both channels stops every participant
        let Self {
            host,
            assets,
            header_tx,
            message_tx,
            message_rx,
            ..
        } = self;
        drop(header_tx);
        drop(message_tx);
        drop(message_rx);

        for (name, handle) in agent_handles {
            let stats = handle
                .await
                .map_err(|e| SimulationError::Task(e.to_string()))?;
            results.agents.insert(name, stats);
        }
        if let Some(handle) = feed_handle {
            handle
                .await
                .map_err(|e| SimulationError::Task(e.to_string()))??;
        }

        results.targets_met = host.all_targets_met()?;
        let token = host.token();
        results.final_supply = from_base_units(host.ledger().total_supply(token)?, 18);

        for asset in &assets.components {
            results.components.push(report(&host, asset, false)?);
        }
        results.components.push(report(&host, &assets.reserve, true)?);

        log::info!(
            "Simulation finished: {} blocks, {} trades, {} sweeps, {} raises, {} failures",
            results.blocks,
            results.trades,
            results.sweeps,
            results.target_raises,
            results.failures()
        );
        if !results.targets_met {
            log::warn!("Simulation stopped before every target was met");
        }
        Ok(results)
    }
}
