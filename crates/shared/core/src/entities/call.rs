use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Who is calling the module
///
/// `sender` is the immediate caller; `origin` is the externally-owned account
/// that signed the transaction. They differ when the call is routed through
/// another contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallContext {
    pub sender: Address,
    pub origin: Address,
}

impl CallContext {
    /// Direct call from an externally-owned account
    pub fn eoa(account: Address) -> Self {
        Self {
            sender: account,
            origin: account,
        }
    }

    /// Call made by `contract` within a transaction signed by `origin`
    pub fn via_contract(contract: Address, origin: Address) -> Self {
        Self {
            sender: contract,
            origin,
        }
    }

    pub fn is_eoa(&self) -> bool {
        self.sender == self.origin
    }
}
