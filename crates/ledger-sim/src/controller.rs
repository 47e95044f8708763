use basket_core::{Address, U256};
use basket_ports::Controller;
use dashmap::{DashMap, DashSet};

/// Protocol controller: enabled index tokens, module fees, fee recipient
#[derive(Debug)]
pub struct SimController {
    index_tokens: DashSet<Address>,
    /// (module, fee index) -> percentage (18 decimals)
    fees: DashMap<(Address, usize), U256>,
    fee_recipient: Address,
}

impl SimController {
    pub fn new(fee_recipient: Address) -> Self {
        Self {
            index_tokens: DashSet::new(),
            fees: DashMap::new(),
            fee_recipient,
        }
    }

    pub fn enable_token(&self, token: Address) {
        self.index_tokens.insert(token);
    }

    pub fn disable_token(&self, token: Address) {
        self.index_tokens.remove(&token);
    }

    pub fn set_module_fee(&self, module: Address, fee_type: usize, percentage: U256) {
        self.fees.insert((module, fee_type), percentage);
    }
}

impl Controller for SimController {
    fn is_index_token(&self, token: Address) -> bool {
        self.index_tokens.contains(&token)
    }

    fn module_fee(&self, module: Address, fee_type: usize) -> U256 {
        self.fees
            .get(&(module, fee_type))
            .map(|fee| *fee)
            .unwrap_or_default()
    }

    fn fee_recipient(&self) -> Address {
        self.fee_recipient
    }
}
