use basket_core::{Address, U256};
use basket_ports::{AdapterResult, ExchangeAdapter, TradeCall, TradeRequest};

use crate::codec::SwapCalldata;

/// Adapter for [`crate::SimExchange`]: the venue pulls the source token
/// itself, so it is both call target and spender
#[derive(Debug, Clone)]
pub struct SimExchangeAdapter {
    address: Address,
    venue: Address,
}

impl SimExchangeAdapter {
    pub fn new(address: Address, venue: Address) -> Self {
        Self { address, venue }
    }
}

impl ExchangeAdapter for SimExchangeAdapter {
    fn address(&self) -> Address {
        self.address
    }

    fn spender(&self) -> Address {
        self.venue
    }

    fn build_trade(&self, request: &TradeRequest) -> AdapterResult<TradeCall> {
        let calldata = if request.is_source_fixed {
            SwapCalldata::exact_input(
                request.source_token,
                request.destination_token,
                request.destination_address,
                request.source_quantity,
                request.destination_quantity,
                &request.data,
            )
        } else {
            SwapCalldata::exact_output(
                request.source_token,
                request.destination_token,
                request.destination_address,
                request.destination_quantity,
                request.source_quantity,
                &request.data,
            )
        };

        Ok(TradeCall {
            target: self.venue,
            value: U256::ZERO,
            calldata: calldata.encode()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basket_core::Bytes;

    #[test]
    fn test_buy_builds_exact_output() {
        let adapter = SimExchangeAdapter::new(Address::repeat_byte(0xad), Address::repeat_byte(0x51));
        let request = TradeRequest {
            source_token: Address::repeat_byte(0xee),
            destination_token: Address::repeat_byte(0xda),
            destination_address: Address::repeat_byte(0x01),
            is_source_fixed: false,
            source_quantity: U256::from(10u64),
            destination_quantity: U256::from(7u64),
            data: Bytes::new(),
        };

        let call = adapter.build_trade(&request).unwrap();
        assert_eq!(call.target, Address::repeat_byte(0x51));
        assert_eq!(call.value, U256::ZERO);

        let order = SwapCalldata::decode(&call.calldata).unwrap().into_order();
        assert!(!order.exact_input);
        assert_eq!(order.amount_out, U256::from(7u64));
        assert_eq!(order.amount_in, U256::from(10u64));
        assert_eq!(order.recipient, Address::repeat_byte(0x01));
    }
}
