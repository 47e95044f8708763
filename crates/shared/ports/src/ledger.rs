use basket_core::{Address, Bytes, ModuleState, U256};

use crate::error::LedgerResult;
use crate::integration::TradeCall;

/// Port onto the index-token ledger (Position Ledger Adapter)
///
/// Exposes per-token positions, supply and multiplier, accepts unit edits, and
/// lets a module act on the token's custody through delegated invocation.
/// Each module operation runs inside one host transaction: if the operation
/// returns an error the host discards every mutation made through this port.
pub trait IndexLedger {
    fn manager(&self, token: Address) -> LedgerResult<Address>;

    fn total_supply(&self, token: Address) -> LedgerResult<U256>;

    /// Live position multiplier (18 decimals)
    fn position_multiplier(&self, token: Address) -> LedgerResult<U256>;

    /// Components currently held, in ledger order
    fn components(&self, token: Address) -> LedgerResult<Vec<Address>>;

    /// Real default position unit of `component` (zero if not held)
    fn default_position_real_unit(&self, token: Address, component: Address)
    -> LedgerResult<U256>;

    fn has_external_position(&self, token: Address, component: Address) -> LedgerResult<bool>;

    fn module_state(&self, token: Address, module: Address) -> LedgerResult<ModuleState>;

    /// Mark a pending module as initialized
    fn initialize_module(&mut self, token: Address, module: Address) -> LedgerResult<()>;

    /// Detach a module from the token
    fn remove_module(&mut self, token: Address, module: Address) -> LedgerResult<()>;

    /// Set the real default position unit of `component`. Adds the component
    /// when it becomes non-zero and removes it when it drops to zero.
    fn edit_default_position_unit(
        &mut self,
        token: Address,
        component: Address,
        real_unit: U256,
    ) -> LedgerResult<()>;

    /// Balance of `asset` held by `holder`
    fn balance_of(&self, asset: Address, holder: Address) -> U256;

    /// Approve `spender` to pull `quantity` of `asset` from the token's custody
    fn invoke_approve(
        &mut self,
        token: Address,
        asset: Address,
        spender: Address,
        quantity: U256,
    ) -> LedgerResult<()>;

    /// Transfer `quantity` of `asset` out of the token's custody
    fn invoke_transfer(
        &mut self,
        token: Address,
        asset: Address,
        to: Address,
        quantity: U256,
    ) -> LedgerResult<()>;

    /// Execute an arbitrary call with the token as caller
    fn invoke(&mut self, token: Address, call: &TradeCall) -> LedgerResult<Bytes>;

    /// Run `call` exactly as [`IndexLedger::invoke`] would and return its
    /// output, discarding every effect
    fn static_invoke(&self, token: Address, call: &TradeCall) -> LedgerResult<Bytes>;
}
