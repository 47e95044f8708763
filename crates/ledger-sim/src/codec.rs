//! Venue calldata
//!
//! Swaps are encoded with `bincode`. Addresses and amounts travel as raw
//! big-endian byte arrays so the wire format does not depend on how the
//! primitive types choose to serialize themselves.

use basket_core::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::VenueResult;

/// Swap instruction understood by [`crate::SimExchange`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapCalldata {
    /// Sell exactly `amount_in`, receive at least `min_amount_out`
    ExactInput {
        source: [u8; 20],
        destination: [u8; 20],
        recipient: [u8; 20],
        amount_in: [u8; 32],
        min_amount_out: [u8; 32],
        memo: Vec<u8>,
    },
    /// Buy exactly `amount_out`, spend at most `max_amount_in`
    ExactOutput {
        source: [u8; 20],
        destination: [u8; 20],
        recipient: [u8; 20],
        amount_out: [u8; 32],
        max_amount_in: [u8; 32],
        memo: Vec<u8>,
    },
}

/// Decoded view of a swap instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOrder {
    pub source: Address,
    pub destination: Address,
    pub recipient: Address,
    pub exact_input: bool,
    /// Exact input, or the input ceiling for exact-output swaps
    pub amount_in: U256,
    /// Minimum output, or the exact output for exact-output swaps
    pub amount_out: U256,
    pub memo: Bytes,
}

fn word(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

impl SwapCalldata {
    pub fn exact_input(
        source: Address,
        destination: Address,
        recipient: Address,
        amount_in: U256,
        min_amount_out: U256,
        memo: &Bytes,
    ) -> Self {
        SwapCalldata::ExactInput {
            source: source.0.0,
            destination: destination.0.0,
            recipient: recipient.0.0,
            amount_in: word(amount_in),
            min_amount_out: word(min_amount_out),
            memo: memo.to_vec(),
        }
    }

    pub fn exact_output(
        source: Address,
        destination: Address,
        recipient: Address,
        amount_out: U256,
        max_amount_in: U256,
        memo: &Bytes,
    ) -> Self {
        SwapCalldata::ExactOutput {
            source: source.0.0,
            destination: destination.0.0,
            recipient: recipient.0.0,
            amount_out: word(amount_out),
            max_amount_in: word(max_amount_in),
            memo: memo.to_vec(),
        }
    }

    pub fn encode(&self) -> VenueResult<Bytes> {
        Ok(Bytes::from(bincode::serialize(self)?))
    }

    pub fn decode(calldata: &[u8]) -> VenueResult<Self> {
        Ok(bincode::deserialize(calldata)?)
    }

    pub fn into_order(self) -> SwapOrder {
        match self {
            SwapCalldata::ExactInput {
                source,
                destination,
                recipient,
                amount_in,
                min_amount_out,
                memo,
            } => SwapOrder {
                source: Address::from(source),
                destination: Address::from(destination),
                recipient: Address::from(recipient),
                exact_input: true,
                amount_in: U256::from_be_bytes(amount_in),
                amount_out: U256::from_be_bytes(min_amount_out),
                memo: Bytes::from(memo),
            },
            SwapCalldata::ExactOutput {
                source,
                destination,
                recipient,
                amount_out,
                max_amount_in,
                memo,
            } => SwapOrder {
                source: Address::from(source),
                destination: Address::from(destination),
                recipient: Address::from(recipient),
                exact_input: false,
                amount_in: U256::from_be_bytes(max_amount_in),
                amount_out: U256::from_be_bytes(amount_out),
                memo: Bytes::from(memo),
            },
        }
    }
}
