//! Supply Feed - index-token supply changes during the rebalance
//!
//! Generates the transactions that move supply and multiplier underneath
//! the traders:
//! - Streaming fee accrual on a fixed block interval (dilutes the multiplier)
//! - Random issuance and redemption by the issuer
//!
//! Participates in block sequencing exactly like a trader agent.

use basket_core::values::{precise_from_decimal, to_base_units};
use basket_core::{Address, CallContext, U256};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::sync::{broadcast, mpsc};

use crate::agent::{BlockHeader, SequencerMessage, TxReceipt, submit};
use crate::config::SupplyFeedConfig;
use crate::error::Result;
use crate::host::{Action, Transaction};

pub const FEED_ID: &str = "supply-feed";

/// Steps used to draw a random issuance size in `(0, max_issuance]`
const ISSUANCE_STEPS: u32 = 1000;

pub struct SupplyFeed {
    issuer: Address,
    inflation: U256,
    fee_interval_blocks: u64,
    issuance_probability: f64,
    max_issuance: Decimal,
    rng: StdRng,
    header_rx: broadcast::Receiver<BlockHeader>,
    tx: mpsc::Sender<SequencerMessage>,
}

impl SupplyFeed {
    pub fn new(
        config: &SupplyFeedConfig,
        issuer: Address,
        seed: u64,
        header_rx: broadcast::Receiver<BlockHeader>,
        tx: mpsc::Sender<SequencerMessage>,
    ) -> Result<Self> {
        Ok(Self {
            issuer,
            inflation: precise_from_decimal(config.streaming_fee)?,
            fee_interval_blocks: config.fee_interval_blocks,
            issuance_probability: config.issuance_probability,
            max_issuance: config.max_issuance,
            rng: StdRng::seed_from_u64(seed),
            header_rx,
            tx,
        })
    }

    /// Actions for `block`: a fee accrual on interval blocks, then maybe an
    /// issuance or redemption
    pub fn next_actions(&mut self, block: u64) -> Result<Vec<Action>> {
        let mut actions = Vec::new();
        if !self.inflation.is_zero()
            && self.fee_interval_blocks > 0
            && block % self.fee_interval_blocks == 0
        {
            actions.push(Action::AccrueStreamingFee {
                inflation: self.inflation,
            });
        }

        if self.max_issuance > Decimal::ZERO && self.rng.gen_bool(self.issuance_probability) {
            let step = self.rng.gen_range(1..=ISSUANCE_STEPS);
            let quantity = to_base_units(
                self.max_issuance * Decimal::from(step) / Decimal::from(ISSUANCE_STEPS),
                18,
            )?;
            if !quantity.is_zero() {
                if self.rng.gen_bool(0.5) {
                    actions.push(Action::Issue { quantity });
                } else {
                    actions.push(Action::Redeem { quantity });
                }
            }
        }
        Ok(actions)
    }

    /// Run until the sequencer stops publishing blocks
    pub async fn run(mut self) -> Result<()> {
        log::info!("[{}] Feed started", FEED_ID);

        loop {
            let header = match self.header_rx.recv().await {
                Ok(header) => header,
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("[{}] Lagged {} blocks", FEED_ID, n);
                    continue;
                }
            };

            let mut receipts = Vec::new();
            for action in self.next_actions(header.number)? {
                let transaction = Transaction::new(CallContext::eoa(self.issuer), action, 0);
                match submit(&self.tx, FEED_ID, transaction).await {
                    Some(receipt) => receipts.push(receipt),
                    None => return Ok(()),
                }
            }
            let done = SequencerMessage::Done {
                participant: FEED_ID.to_string(),
                block: header.number,
            };
            if self.tx.send(done).await.is_err() {
                break;
            }

            for receipt in receipts {
                if let Ok(TxReceipt {
                    outcome: Err(reason),
                    ..
                }) = receipt.await
                {
                    log::debug!("[{}] Reverted: {}", FEED_ID, reason);
                }
            }
        }

        log::info!("[{}] Feed stopped", FEED_ID);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn feed(config: SupplyFeedConfig) -> SupplyFeed {
        let (_header_tx, header_rx) = broadcast::channel(4);
        let (tx, _rx) = mpsc::channel(4);
        SupplyFeed::new(&config, Address::repeat_byte(0x30), 42, header_rx, tx).unwrap()
    }

    #[test]
    fn test_fee_accrues_on_interval() {
        let mut feed = feed(SupplyFeedConfig {
            streaming_fee: dec!(0.001),
            fee_interval_blocks: 3,
            issuance_probability: 0.0,
            ..Default::default()
        });

        let accruals: Vec<u64> = (1..=9)
            .filter(|b| !feed.next_actions(*b).unwrap().is_empty())
            .collect();
        assert_eq!(accruals, vec![3, 6, 9]);
        assert_eq!(
            feed.next_actions(12).unwrap(),
            vec![Action::AccrueStreamingFee {
                inflation: U256::from(1_000_000_000_000_000u64),
            }]
        );
    }

    #[test]
    fn test_issuance_stays_within_bounds() {
        let mut feed = feed(SupplyFeedConfig {
            streaming_fee: Decimal::ZERO,
            issuance_probability: 1.0,
            max_issuance: dec!(2),
            ..Default::default()
        });
        let max = to_base_units(dec!(2), 18).unwrap();

        let mut issued = 0;
        let mut redeemed = 0;
        for block in 1..=50 {
            for action in feed.next_actions(block).unwrap() {
                match action {
                    Action::Issue { quantity } => {
                        assert!(!quantity.is_zero() && quantity <= max);
                        issued += 1;
                    }
                    Action::Redeem { quantity } => {
                        assert!(!quantity.is_zero() && quantity <= max);
                        redeemed += 1;
                    }
                    other => panic!("unexpected {other:?}"),
                }
            }
        }
        assert_eq!(issued + redeemed, 50);
        assert!(issued > 0 && redeemed > 0);
    }
}
