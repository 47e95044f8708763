use basket_core::{Address, U256};

/// Protocol-wide controller
///
/// Knows which index tokens are enabled and the protocol fee charged by each
/// module for each fee type.
pub trait Controller: Send + Sync {
    /// Whether `token` is a controller-enabled index token
    fn is_index_token(&self, token: Address) -> bool;

    /// Fee percentage (18 decimals) for `module` and `fee_type`
    fn module_fee(&self, module: Address, fee_type: usize) -> U256;

    /// Where protocol fees are sent
    fn fee_recipient(&self) -> Address;
}
