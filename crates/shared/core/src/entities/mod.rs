mod call;
mod events;
mod execution;
mod module_state;
mod permission;
mod rebalance;

pub use call::CallContext;
pub use events::ModuleEvent;
pub use execution::ExecutionInfo;
pub use module_state::ModuleState;
pub use permission::{PermissionInfo, TraderAllowList};
pub use rebalance::RebalanceInfo;
