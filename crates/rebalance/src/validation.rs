//! Parallel-array argument checks shared by the setter operations

use basket_core::Address;
use std::collections::HashSet;

use crate::error::{RebalanceError, Result};

pub(crate) fn has_duplicate(addresses: &[Address]) -> bool {
    let mut seen = HashSet::with_capacity(addresses.len());
    addresses.iter().any(|a| !seen.insert(*a))
}

/// Equal, non-empty lengths and unique addresses, checked in that order
pub(crate) fn validate_pairs<T>(addresses: &[Address], values: &[T]) -> Result<()> {
    if addresses.len() != values.len() {
        return Err(RebalanceError::ArrayLengthMismatch);
    }
    if addresses.is_empty() {
        return Err(RebalanceError::EmptyArray);
    }
    if has_duplicate(addresses) {
        return Err(RebalanceError::DuplicateAddresses);
    }
    Ok(())
}
