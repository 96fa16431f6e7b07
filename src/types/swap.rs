//! Swap request and receipt types exchanged with the ledger client

use alloy::primitives::{Address, U256};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwapKind {
    /// Native coin in, target token out.
    ExactNativeForTokens,
    /// Target token in, native coin out.
    ExactTokensForNative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapRequest {
    pub kind: SwapKind,
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub recipient: Address,
    /// Unix seconds.
    pub deadline: u64,
    /// Wei per gas.
    pub fee_rate: u128,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapReceipt {
    pub success: bool,
    pub confirmed_block: Option<u64>,
    pub tx_hash: String,
}
