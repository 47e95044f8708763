use basket_core::Timestamp;
use basket_ports::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Genesis time used by [`BlockClock::genesis`] (2024-01-01T00:00:00Z)
const GENESIS_UNIX: i64 = 1_704_067_200;

/// Discrete block-time clock
///
/// Time only moves when a block is mined. Every call sequenced into the same
/// block observes the same timestamp, which is what the rebalancing module's
/// cool-off windows are measured against. Resolution is one second.
#[derive(Debug)]
pub struct BlockClock {
    /// Unix seconds of the current block
    timestamp: AtomicI64,
    /// Current block number
    number: AtomicU64,
}

impl BlockClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            timestamp: AtomicI64::new(start.timestamp()),
            number: AtomicU64::new(0),
        }
    }

    /// Clock at the fixed genesis time, block zero
    pub fn genesis() -> Self {
        Self {
            timestamp: AtomicI64::new(GENESIS_UNIX),
            number: AtomicU64::new(0),
        }
    }

    /// Mine a block `interval` after the current one; returns its number.
    /// Negative intervals are treated as zero.
    pub fn mine(&self, interval: Duration) -> u64 {
        let secs = interval.num_seconds().max(0);
        self.timestamp.fetch_add(secs, Ordering::SeqCst);
        self.number.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Move time forward without producing a block
    pub fn advance(&self, duration: Duration) {
        let secs = duration.num_seconds().max(0);
        self.timestamp.fetch_add(secs, Ordering::SeqCst);
    }

    /// Explicitly set the block timestamp
    ///
    /// Warning: moving backwards breaks cool-off accounting.
    pub fn set_time(&self, time: Timestamp) {
        self.timestamp.store(time.timestamp(), Ordering::SeqCst);
    }

    pub fn block_number(&self) -> u64 {
        self.number.load(Ordering::SeqCst)
    }
}

impl Default for BlockClock {
    fn default() -> Self {
        Self::genesis()
    }
}

impl Clock for BlockClock {
    fn now(&self) -> Timestamp {
        DateTime::<Utc>::from_timestamp(self.timestamp.load(Ordering::SeqCst), 0)
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "BlockClock"
    }
}
