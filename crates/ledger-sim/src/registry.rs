use basket_core::Address;
use basket_ports::{AdapterResolver, ExchangeAdapter};
use dashmap::DashMap;
use log::info;
use std::sync::Arc;

/// Integration registry: (module, exchange name) -> adapter
#[derive(Default)]
pub struct IntegrationRegistry {
    adapters: DashMap<(Address, String), Arc<dyn ExchangeAdapter>>,
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_integration(
        &self,
        module: Address,
        name: impl Into<String>,
        adapter: Arc<dyn ExchangeAdapter>,
    ) {
        let name = name.into();
        info!(
            "[REGISTRY] Integration added: module={}, name={}, adapter={}",
            module,
            name,
            adapter.address()
        );
        self.adapters.insert((module, name), adapter);
    }

    pub fn remove_integration(&self, module: Address, name: &str) -> bool {
        self.adapters.remove(&(module, name.to_string())).is_some()
    }
}

impl AdapterResolver for IntegrationRegistry {
    fn resolve(&self, module: Address, name: &str) -> Option<Arc<dyn ExchangeAdapter>> {
        self.adapters
            .get(&(module, name.to_string()))
            .map(|entry| Arc::clone(entry.value()))
    }
}
