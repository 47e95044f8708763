//! Agent Runner - trader agents and the messages they exchange with the
//! sequencer
//!
//! Each block the sequencer broadcasts a [`BlockHeader`] carrying the trade
//! every component needs. A trader picks one, submits a transaction, signals
//! it is done for the block, then waits for the receipt.

use basket_core::{Address, CallContext, Timestamp, U256};
use basket_rebalance::ComponentTrade;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use uuid::Uuid;

use crate::host::{Action, Effect, Transaction};

/// Published by the sequencer at the start of every block
#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub number: u64,
    pub timestamp: Timestamp,
    /// Non-zero trades still needed, per component
    pub pending_trades: Vec<(Address, ComponentTrade)>,
}

/// Outcome of a submitted transaction
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub id: Uuid,
    pub block: u64,
    pub outcome: Result<Effect, String>,
}

#[derive(Debug)]
pub struct Submission {
    pub from: String,
    pub transaction: Transaction,
    pub reply: oneshot::Sender<TxReceipt>,
}

/// Participant -> sequencer
#[derive(Debug)]
pub enum SequencerMessage {
    Submit(Submission),
    /// Nothing more from `participant` for `block`
    Done { participant: String, block: u64 },
}

/// Submit `transaction` and return the receipt channel
pub(crate) async fn submit(
    tx: &mpsc::Sender<SequencerMessage>,
    from: &str,
    transaction: Transaction,
) -> Option<oneshot::Receiver<TxReceipt>> {
    let (reply, receipt) = oneshot::channel();
    let message = SequencerMessage::Submit(Submission {
        from: from.to_string(),
        transaction,
        reply,
    });
    tx.send(message).await.ok()?;
    Some(receipt)
}

/// Trader agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub agent_id: String,
    pub account: Address,
    /// Chance per block of submitting anything
    pub activity: f64,
    /// Chance a submission is a reserve sweep
    pub sweep_probability: f64,
    /// Most reserve one buy may spend
    pub buy_reserve_limit: U256,
    pub max_priority_fee: u64,
    pub seed: u64,
}

/// What an agent did over its lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    pub submitted: u64,
    pub committed: u64,
    pub reverted: u64,
}

pub struct TraderAgent {
    config: AgentConfig,
    rng: StdRng,
    header_rx: broadcast::Receiver<BlockHeader>,
    tx: mpsc::Sender<SequencerMessage>,
    stats: AgentStats,
}

impl TraderAgent {
    pub fn new(
        config: AgentConfig,
        header_rx: broadcast::Receiver<BlockHeader>,
        tx: mpsc::Sender<SequencerMessage>,
    ) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            header_rx,
            tx,
            stats: AgentStats::default(),
        }
    }

    /// Pick this block's action, if any.
    ///
    /// Sells accept any amount of reserve; buys spend at most the configured
    /// limit. Sweeps are only tried once nothing is left to sell.
    pub fn next_action(&mut self, header: &BlockHeader) -> Option<Action> {
        let candidates: Vec<&(Address, ComponentTrade)> = header
            .pending_trades
            .iter()
            .filter(|(_, trade)| !trade.quantity.is_zero())
            .collect();
        if candidates.is_empty() || !self.rng.gen_bool(self.config.activity) {
            return None;
        }

        let (component, trade) = *candidates[self.rng.gen_range(0..candidates.len())];
        let nothing_to_sell = candidates.iter().all(|(_, t)| !t.is_selling);
        if nothing_to_sell && self.rng.gen_bool(self.config.sweep_probability) {
            return Some(Action::TradeRemainingReserve {
                component,
                min_component_received: U256::ZERO,
            });
        }

        let reserve_limit = if trade.is_selling {
            U256::ZERO
        } else {
            self.config.buy_reserve_limit
        };
        Some(Action::Trade {
            component,
            reserve_limit,
        })
    }

    async fn done(&self, block: u64) -> bool {
        self.tx
            .send(SequencerMessage::Done {
                participant: self.config.agent_id.clone(),
                block,
            })
            .await
            .is_ok()
    }

    async fn handle_block(&mut self, header: BlockHeader) -> bool {
        let Some(action) = self.next_action(&header) else {
            return self.done(header.number).await;
        };

        let priority_fee = self.rng.gen_range(0..=self.config.max_priority_fee);
        let transaction = Transaction::new(
            CallContext::eoa(self.config.account),
            action,
            priority_fee,
        );
        log::debug!(
            "[{}] Block {}: submitting {} (fee {})",
            self.config.agent_id,
            header.number,
            transaction.action.kind(),
            priority_fee
        );

        let Some(receipt) = submit(&self.tx, &self.config.agent_id, transaction).await else {
            return false;
        };
        self.stats.submitted += 1;
        if !self.done(header.number).await {
            return false;
        }

        match receipt.await {
            Ok(TxReceipt { outcome: Ok(_), .. }) => self.stats.committed += 1,
            Ok(TxReceipt {
                outcome: Err(reason),
                ..
            }) => {
                self.stats.reverted += 1;
                log::debug!("[{}] Reverted: {}", self.config.agent_id, reason);
            }
            Err(_) => log::debug!("[{}] Submission dropped", self.config.agent_id),
        }
        true
    }

    /// Run until the sequencer stops publishing blocks
    pub async fn run(mut self) -> AgentStats {
        log::info!("[{}] Agent started", self.config.agent_id);

        loop {
            match self.header_rx.recv().await {
                Ok(header) => {
                    if !self.handle_block(header).await {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("[{}] Lagged {} blocks", self.config.agent_id, n);
                }
            }
        }

        log::info!(
            "[{}] Agent stopped: submitted={}, committed={}, reverted={}",
            self.config.agent_id,
            self.stats.submitted,
            self.stats.committed,
            self.stats.reverted
        );
        self.stats
    }
}
