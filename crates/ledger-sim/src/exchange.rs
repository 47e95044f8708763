use basket_core::values::precise::{precise_div, precise_div_ceil, precise_mul, precise_mul_ceil};
use basket_core::{Address, PRECISE_UNIT, U256};
use std::collections::HashMap;

use crate::error::{VenueError, VenueResult};

/// Fixed-price exchange venue
///
/// Prices are quoted in reserve-asset wei per base unit of each asset, as an
/// 18-decimal fixed point. The reserve itself is priced at exactly one. Exact
/// input swaps round the output down; exact output swaps round the input up,
/// so the venue never loses to rounding.
#[derive(Debug, Clone)]
pub struct SimExchange {
    address: Address,
    name: String,
    prices: HashMap<Address, U256>,
}

impl SimExchange {
    pub fn new(address: Address, name: impl Into<String>, reserve_asset: Address) -> Self {
        let mut prices = HashMap::new();
        prices.insert(reserve_asset, PRECISE_UNIT);
        Self {
            address,
            name: name.into(),
            prices,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_price(&mut self, asset: Address, price: U256) {
        self.prices.insert(asset, price);
    }

    pub fn price(&self, asset: Address) -> VenueResult<U256> {
        match self.prices.get(&asset) {
            Some(price) if !price.is_zero() => Ok(*price),
            _ => Err(VenueError::UnlistedAsset(asset)),
        }
    }

    /// Output for selling exactly `amount_in` of `source`
    pub fn quote_exact_input(
        &self,
        source: Address,
        destination: Address,
        amount_in: U256,
    ) -> VenueResult<U256> {
        let value = precise_mul(amount_in, self.price(source)?)?;
        Ok(precise_div(value, self.price(destination)?)?)
    }

    /// Input needed to buy exactly `amount_out` of `destination`
    pub fn quote_exact_output(
        &self,
        source: Address,
        destination: Address,
        amount_out: U256,
    ) -> VenueResult<U256> {
        let value = precise_mul_ceil(amount_out, self.price(destination)?)?;
        Ok(precise_div_ceil(value, self.price(source)?)?)
    }
}
