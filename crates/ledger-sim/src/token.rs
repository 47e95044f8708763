use basket_core::{Address, ModuleState, PositionMultiplier, U256};
use std::collections::{HashMap, HashSet};

/// One index token as the ledger records it
///
/// Default positions are stored as *virtual* units; the real unit is the
/// virtual unit scaled by the position multiplier.
#[derive(Debug, Clone)]
pub struct SimIndexToken {
    pub address: Address,
    pub manager: Address,
    pub total_supply: U256,
    pub position_multiplier: PositionMultiplier,
    /// Held components in the order they were added
    pub components: Vec<Address>,
    pub virtual_units: HashMap<Address, U256>,
    pub external_positions: HashSet<Address>,
    pub modules: HashMap<Address, ModuleState>,
}

impl SimIndexToken {
    pub fn new(address: Address, manager: Address) -> Self {
        Self {
            address,
            manager,
            total_supply: U256::ZERO,
            position_multiplier: PositionMultiplier::ONE,
            components: Vec::new(),
            virtual_units: HashMap::new(),
            external_positions: HashSet::new(),
            modules: HashMap::new(),
        }
    }

    pub fn is_component(&self, component: &Address) -> bool {
        self.virtual_units.contains_key(component)
    }

    pub fn module_state(&self, module: &Address) -> ModuleState {
        self.modules.get(module).copied().unwrap_or_default()
    }

    /// Set a virtual unit, adding or dropping the component as it moves
    /// between zero and non-zero
    pub fn set_virtual_unit(&mut self, component: Address, virtual_unit: U256) {
        if virtual_unit.is_zero() {
            if self.virtual_units.remove(&component).is_some() {
                self.components.retain(|c| *c != component);
            }
            return;
        }
        if self
            .virtual_units
            .insert(component, virtual_unit)
            .is_none()
        {
            self.components.push(component);
        }
    }
}
