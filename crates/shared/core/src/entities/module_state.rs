use serde::{Deserialize, Serialize};

/// Lifecycle of a module on an index token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModuleState {
    #[default]
    NotAdded,
    /// Added by the manager, waiting for the module's `initialize`
    Pending,
    Initialized,
}
