//! Capabilities the orchestrator needs from the chain

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use crate::{
    errors::BotResult,
    types::{SwapReceipt, SwapRequest},
};

/// Source of the network's current fee rate, in wei per gas.
#[async_trait]
pub trait FeeRateSource: Send + Sync {
    async fn fee_rate(&self) -> BotResult<u128>;
}

#[async_trait]
pub trait LedgerClient: FeeRateSource {
    async fn native_balance(&self, owner: Address) -> BotResult<U256>;

    /// Balance of the traded token held by `owner`.
    async fn token_balance(&self, owner: Address) -> BotResult<U256>;

    async fn quote_swap(&self, amount_in: U256, path: &[Address]) -> BotResult<Vec<U256>>;

    /// Submits the swap and waits for its receipt.
    async fn submit_swap(&self, request: &SwapRequest) -> BotResult<SwapReceipt>;

    async fn approve_allowance(&self, spender: Address, amount: U256) -> BotResult<SwapReceipt>;

    async fn allowance(&self, owner: Address, spender: Address) -> BotResult<U256>;
}
