//! Basket Clock Infrastructure
//!
//! Block time for the rebalancing module's cool-off checks. [`BlockClock`]
//! only moves when a sequencer mines a block or a test advances it.
//!
//! ## Usage
//!
//! ```ignore
//! use basket_clock::BlockClock;
//! use chrono::Duration;
//!
//! let clock = BlockClock::genesis();
//! let block = clock.mine(Duration::seconds(12));
//! assert_eq!(block, 1);
//! ```

mod block;

pub use block::BlockClock;

// Re-export the Clock trait for convenience
pub use basket_ports::Clock;
