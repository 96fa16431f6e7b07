#![allow(dead_code)]

use alloy::primitives::{address, Address, U256};
use amm_volume_bot::config::{DelayRange, TradePlan, TradingConfig};
use amm_volume_bot::errors::{BotError, BotResult};
use amm_volume_bot::network::{FeeRateSource, LedgerClient, RetryConfig};
use amm_volume_bot::notify::Notifier;
use amm_volume_bot::safeguards::SafeguardConfig;
use amm_volume_bot::types::{SwapKind, SwapReceipt, SwapRequest, TradeReport};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub const WALLET: Address = address!("1111111111111111111111111111111111111111");
pub const TOKEN: Address = address!("2222222222222222222222222222222222222222");
pub const WETH: Address = address!("3333333333333333333333333333333333333333");
pub const ROUTER: Address = address!("4444444444444444444444444444444444444444");

pub const GWEI: u128 = 1_000_000_000;

pub fn ether(amount: Decimal) -> U256 {
    amm_volume_bot::utils::parse_ether(amount).unwrap()
}

pub fn one_ether() -> U256 {
    U256::from(10u64).pow(U256::from(18u64))
}

#[derive(Debug, Clone)]
pub struct LedgerState {
    pub native_balance: U256,
    pub token_balance: U256,
    pub fee_rate: u128,
    /// Native wei paid for one whole token.
    pub price: U256,
    pub allowance: U256,
    pub swaps: Vec<SwapRequest>,
    pub submit_calls: u32,
    pub approvals: u32,
    pub transient_failures: u32,
    pub insufficient_funds: bool,
    pub revert_swaps: bool,
    pub fail_fee_rate: bool,
    /// Fee rates handed out, one per call, before falling back to `fee_rate`.
    pub fee_rate_overrides: VecDeque<u128>,
    /// Spot prices handed out, one per one-token quote, before falling back to `price`.
    pub spot_price_overrides: VecDeque<U256>,
    pub quote_failures: u32,
    /// Output shortfall applied to every quote except the one-token spot quote.
    pub price_impact_percent: u64,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            native_balance: one_ether(),
            token_balance: one_ether(),
            fee_rate: 5 * GWEI,
            price: U256::from(1_000_000_000_000_000u64),
            allowance: U256::ZERO,
            swaps: Vec::new(),
            submit_calls: 0,
            approvals: 0,
            transient_failures: 0,
            insufficient_funds: false,
            revert_swaps: false,
            fail_fee_rate: false,
            fee_rate_overrides: VecDeque::new(),
            spot_price_overrides: VecDeque::new(),
            quote_failures: 0,
            price_impact_percent: 0,
        }
    }
}

/// In-memory router: prices are constant and swaps settle immediately.
#[derive(Default)]
pub struct MockLedger {
    pub state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new(state: LedgerState) -> Self {
        Self { state: Mutex::new(state) }
    }

    pub fn snapshot(&self) -> LedgerState {
        self.state.lock().unwrap().clone()
    }

    pub fn swaps(&self) -> Vec<SwapRequest> {
        self.state.lock().unwrap().swaps.clone()
    }
}

#[async_trait]
impl FeeRateSource for MockLedger {
    async fn fee_rate(&self) -> BotResult<u128> {
        let mut state = self.state.lock().unwrap();
        if state.fail_fee_rate {
            return Err(BotError::network("fee rate unavailable"));
        }
        Ok(state.fee_rate_overrides.pop_front().unwrap_or(state.fee_rate))
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn native_balance(&self, _owner: Address) -> BotResult<U256> {
        Ok(self.state.lock().unwrap().native_balance)
    }

    async fn token_balance(&self, _owner: Address) -> BotResult<U256> {
        Ok(self.state.lock().unwrap().token_balance)
    }

    async fn quote_swap(&self, amount_in: U256, path: &[Address]) -> BotResult<Vec<U256>> {
        let mut state = self.state.lock().unwrap();
        if state.quote_failures > 0 {
            state.quote_failures -= 1;
            return Err(BotError::network("quote unavailable"));
        }
        let out = if path.first() == Some(&TOKEN) {
            let price = if amount_in == one_ether() {
                state.spot_price_overrides.pop_front().unwrap_or(state.price)
            } else {
                state.price
            };
            amount_in * price / one_ether()
        } else {
            amount_in * one_ether() / state.price
        };
        let out = if amount_in == one_ether() {
            out
        } else {
            out * U256::from(100 - state.price_impact_percent) / U256::from(100u64)
        };
        Ok(vec![amount_in, out])
    }

    async fn submit_swap(&self, request: &SwapRequest) -> BotResult<SwapReceipt> {
        let mut state = self.state.lock().unwrap();
        state.submit_calls += 1;

        if state.transient_failures > 0 {
            state.transient_failures -= 1;
            return Err(BotError::network("connection reset"));
        }
        if state.insufficient_funds {
            return Err(BotError::from_rpc("swap", "insufficient funds for gas * price + value"));
        }
        if state.revert_swaps {
            return Ok(SwapReceipt {
                success: false,
                confirmed_block: Some(1),
                tx_hash: format!("0xrevert{}", state.submit_calls),
            });
        }

        match request.kind {
            SwapKind::ExactNativeForTokens => {
                let out = request.amount_in * one_ether() / state.price;
                state.native_balance = state.native_balance.saturating_sub(request.amount_in);
                state.token_balance += out;
            }
            SwapKind::ExactTokensForNative => {
                let out = request.amount_in * state.price / one_ether();
                state.token_balance = state.token_balance.saturating_sub(request.amount_in);
                state.native_balance += out;
            }
        }
        state.swaps.push(request.clone());

        Ok(SwapReceipt {
            success: true,
            confirmed_block: Some(100 + state.swaps.len() as u64),
            tx_hash: format!("0x{:064x}", state.swaps.len()),
        })
    }

    async fn approve_allowance(&self, _spender: Address, amount: U256) -> BotResult<SwapReceipt> {
        let mut state = self.state.lock().unwrap();
        state.approvals += 1;
        state.allowance = amount;
        Ok(SwapReceipt {
            success: true,
            confirmed_block: Some(1),
            tx_hash: "0xapprove".to_string(),
        })
    }

    async fn allowance(&self, _owner: Address, _spender: Address) -> BotResult<U256> {
        Ok(self.state.lock().unwrap().allowance)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub reports: Mutex<Vec<TradeReport>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, report: &TradeReport) -> BotResult<()> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

/// No waiting between tranches or before selling.
pub fn instant_plan() -> TradePlan {
    TradePlan {
        buy_delay: DelayRange::new(0, 0),
        sell_delay: DelayRange::new(0, 0),
        ..TradePlan::default()
    }
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_factor: 2.0,
        jitter_factor: 0.0,
    }
}

pub fn trading_config(plan: TradePlan) -> TradingConfig {
    TradingConfig {
        wallet_address: WALLET,
        token: TOKEN,
        weth: WETH,
        router: ROUTER,
        min_amount: dec!(0.0001),
        buy_amount_mean: dec!(0.001),
        enforce_price_impact: false,
        plan,
        retry: fast_retry(),
    }
}

pub fn safeguards() -> SafeguardConfig {
    SafeguardConfig::default()
}
