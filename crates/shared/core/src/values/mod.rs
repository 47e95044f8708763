use chrono::{DateTime, Utc};

mod decimal;
mod multiplier;
pub mod precise;

pub use alloy_primitives::{Address, Bytes, U256};
pub use decimal::{from_base_units, precise_from_decimal, to_base_units};
pub use multiplier::{PositionMultiplier, normalize_unit};
pub use precise::{MathError, MathResult, PRECISE_UNIT};

/// Amount of a component held per whole index token (18 decimal fixed point
/// over the component's base units)
pub type Unit = U256;

/// Absolute amount of a component in base units (unit × total supply)
pub type Notional = U256;

/// Block timestamp in UTC
pub type Timestamp = DateTime<Utc>;
