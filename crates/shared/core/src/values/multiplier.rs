use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::precise::{self, MathError, MathResult, PRECISE_UNIT};

/// Global dilution factor of an index token
///
/// The ledger stores *virtual* units; the real amount held per index token is
/// `virtual × multiplier / 10^18`. Fee mechanisms dilute every position at once
/// by shrinking the multiplier instead of rewriting each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PositionMultiplier(U256);

impl PositionMultiplier {
    /// Undiluted multiplier (1.0)
    pub const ONE: Self = Self(PRECISE_UNIT);

    /// Wrap a raw 18-decimal multiplier. Zero is allowed and means "unset".
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> U256 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Virtual unit -> real unit (rounded down)
    pub fn real_unit(self, virtual_unit: U256) -> MathResult<U256> {
        precise::precise_mul(virtual_unit, self.0)
    }

    /// Real unit -> virtual unit (rounded down)
    pub fn virtual_unit(self, real_unit: U256) -> MathResult<U256> {
        precise::precise_div(real_unit, self.0)
    }

    /// Multiplier after diluting every position by `percentage` (18 decimals)
    pub fn dilute(self, percentage: U256) -> MathResult<Self> {
        let remaining = precise::checked_sub(PRECISE_UNIT, percentage)?;
        Ok(Self(precise::precise_mul(self.0, remaining)?))
    }

    /// `multiplier / (1 + percentage)`, rounded down
    ///
    /// Dividing a rebalance snapshot by this factor raises every target that
    /// is normalised against it by the same percentage.
    pub fn shrink_by(self, percentage: U256) -> MathResult<Self> {
        let factor = precise::checked_add(PRECISE_UNIT, percentage)?;
        Ok(Self(precise::precise_div(self.0, factor)?))
    }
}

impl std::fmt::Display for PositionMultiplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Re-express a unit declared at multiplier `from` in terms of multiplier `to`
///
/// `unit × to / from`, rounded down. A target recorded when a rebalance began is
/// compared to live units only after passing through here.
pub fn normalize_unit(
    unit: U256,
    from: PositionMultiplier,
    to: PositionMultiplier,
) -> MathResult<U256> {
    if from.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    precise::mul_div(unit, to.raw(), from.raw())
}
