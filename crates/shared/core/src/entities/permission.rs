use alloy_primitives::Address;
use std::collections::HashMap;

/// Enumerable set of traders
///
/// A map from trader to its slot in a dense backing vector. Removal swaps the
/// last trader into the vacated slot, so enumeration never sees gaps. Slots are
/// internal and shift on removal; only membership and iteration are exposed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraderAllowList {
    slots: HashMap<Address, usize>,
    traders: Vec<Address>,
}

impl TraderAllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, trader: &Address) -> bool {
        self.slots.contains_key(trader)
    }

    /// Add a trader; returns false if already present
    pub fn insert(&mut self, trader: Address) -> bool {
        if self.contains(&trader) {
            return false;
        }
        self.slots.insert(trader, self.traders.len());
        self.traders.push(trader);
        true
    }

    /// Remove a trader in O(1); returns false if absent
    pub fn remove(&mut self, trader: &Address) -> bool {
        let Some(slot) = self.slots.remove(trader) else {
            return false;
        };
        self.traders.swap_remove(slot);
        if let Some(moved) = self.traders.get(slot) {
            self.slots.insert(*moved, slot);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.traders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.traders.iter()
    }

    pub fn to_vec(&self) -> Vec<Address> {
        self.traders.clone()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.traders.clear();
    }
}

/// Who may trade an index token's rebalance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionInfo {
    /// Public trading: anyone may call, but only from an externally-owned account
    pub anyone_trade: bool,
    pub allow_list: TraderAllowList,
}

impl PermissionInfo {
    pub fn is_allowed(&self, trader: &Address) -> bool {
        self.anyone_trade || self.allow_list.contains(trader)
    }

    pub fn set_status(&mut self, trader: Address, status: bool) {
        if status {
            self.allow_list.insert(trader);
        } else {
            self.allow_list.remove(&trader);
        }
    }
}
