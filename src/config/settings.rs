//! Bot configuration settings and environment variable handling

use alloy::primitives::Address;
use rand::Rng;
use reqwest::Url;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use crate::{
    errors::{BotError, BotResult},
    network::RetryConfig,
    safeguards::SafeguardConfig,
};

// Trade plan constants
pub const BUY_SPLITS: u32 = 3;
pub const BUY_BASE_PERCENTAGE: Decimal = dec!(0.018);
pub const SELL_SIZE_MULTIPLIER: Decimal = dec!(1.0);
pub const SWAP_SLIPPAGE_PERCENT: u64 = 40;
pub const AMOUNT_JITTER: Decimal = dec!(0.05);
pub const SELL_BALANCE_CAP: Decimal = dec!(0.95);
pub const BOOTSTRAP_BUY_MULTIPLIER: Decimal = dec!(3);
pub const RETRY_COOLDOWN_MINUTES: u64 = 5;

// Gas constants
pub const SWAP_GAS_LIMIT: u64 = 500_000;
pub const GAS_RESERVE_MULTIPLIER: u64 = 3;
pub const MAX_BALANCE_SHARE_FOR_GAS_PCT: u64 = 30;
pub const MIN_FEE_RATE_WEI: u128 = 1_000_000_000;
pub const SWAP_DEADLINE_SECS: u64 = 20 * 60;

// Production defaults
pub const DEFAULT_MIN_AMOUNT: Decimal = dec!(0.0001);
pub const DEFAULT_BUY_AMOUNT_MEAN: Decimal = dec!(0.001);
pub const DEFAULT_SMTP_HOST: &str = "smtp.hostinger.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// Inclusive range of whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_minutes: u64,
    pub max_minutes: u64,
}

impl DelayRange {
    pub const fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self { min_minutes, max_minutes }
    }

    pub fn min(&self) -> Duration {
        Duration::from_secs(self.min_minutes * 60)
    }

    /// Whole minutes, uniform over the range.
    pub fn sample_minutes(&self) -> u64 {
        if self.max_minutes <= self.min_minutes {
            return self.min_minutes;
        }
        rand::rng().random_range(self.min_minutes..=self.max_minutes)
    }

    /// Second granularity, uniform over the range.
    pub fn sample_duration(&self) -> Duration {
        let (lo, hi) = (self.min_minutes * 60, self.max_minutes * 60);
        if hi <= lo {
            return Duration::from_secs(lo);
        }
        Duration::from_secs(rand::rng().random_range(lo..=hi))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradePlan {
    pub buy_splits: u32,
    pub buy_base_percentage: Decimal,
    pub buy_delay: DelayRange,
    pub sell_size_multiplier: Decimal,
    pub sell_delay: DelayRange,
    pub swap_slippage_percent: u64,
    pub amount_jitter: Decimal,
    pub sell_balance_cap: Decimal,
    pub bootstrap_multiplier: Decimal,
    pub retry_cooldown: Duration,
    pub gas_limit: u64,
    pub gas_reserve_multiplier: u64,
    pub deadline: Duration,
}

impl Default for TradePlan {
    fn default() -> Self {
        Self {
            buy_splits: BUY_SPLITS,
            buy_base_percentage: BUY_BASE_PERCENTAGE,
            buy_delay: DelayRange::new(15, 35),
            sell_size_multiplier: SELL_SIZE_MULTIPLIER,
            sell_delay: DelayRange::new(15, 35),
            swap_slippage_percent: SWAP_SLIPPAGE_PERCENT,
            amount_jitter: AMOUNT_JITTER,
            sell_balance_cap: SELL_BALANCE_CAP,
            bootstrap_multiplier: BOOTSTRAP_BUY_MULTIPLIER,
            retry_cooldown: Duration::from_secs(RETRY_COOLDOWN_MINUTES * 60),
            gas_limit: SWAP_GAS_LIMIT,
            gas_reserve_multiplier: GAS_RESERVE_MULTIPLIER,
            deadline: Duration::from_secs(SWAP_DEADLINE_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub thread_id: Option<String>,
}

/// SMTP account the report is sent from. The address doubles as the login.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub address: String,
    pub password: String,
    pub recipient: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("address", &self.address)
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

/// Addresses and sizing the orchestrator trades with.
#[derive(Debug, Clone)]
pub struct TradingConfig {
    pub wallet_address: Address,
    pub token: Address,
    pub weth: Address,
    pub router: Address,
    pub min_amount: Decimal,
    pub buy_amount_mean: Decimal,
    pub enforce_price_impact: bool,
    pub plan: TradePlan,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: Url,
    pub wallet_address: Address,
    pub private_key: Option<String>,
    pub token: Address,
    pub weth: Address,
    pub router: Address,
    pub min_amount: Decimal,
    pub buy_amount_mean: Decimal,
    pub enforce_price_impact: bool,
    pub safeguards: SafeguardConfig,
    pub retry: RetryConfig,
    pub plan: TradePlan,
    pub schedule_file: PathBuf,
    pub report_dir: PathBuf,
    pub send_file_report: bool,
    pub telegram: Option<TelegramConfig>,
    pub email: Option<EmailConfig>,
}

impl Config {
    pub fn load() -> BotResult<Self> {
        let defaults = SafeguardConfig::default();

        let send_telegram = env_flag("SEND_TELEGRAM_REPORT", false);
        let telegram = if send_telegram {
            Some(TelegramConfig {
                bot_token: required("TELEGRAM_BOT_TOKEN")?,
                chat_id: required("TELEGRAM_CHAT_ID")?,
                thread_id: env::var("TELEGRAM_THREAD_ID").ok().filter(|s| !s.is_empty()),
            })
        } else {
            None
        };

        let email = if env_flag("SEND_EMAIL_REPORT", false) {
            Some(EmailConfig {
                smtp_host: env::var("SMTP_HOST")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                smtp_port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(DEFAULT_SMTP_PORT),
                address: required("EMAIL_ADDR")?,
                password: required("EMAIL_PW")?,
                recipient: required("RECIPIENT")?,
            })
        } else {
            None
        };

        let rpc_url = required("RPC_URL")?;

        Ok(Self {
            rpc_url: Url::parse(&rpc_url)
                .map_err(|e| BotError::Config(format!("RPC_URL is not a valid URL: {}", e)))?,
            wallet_address: required_address("USER_ADDRESS")?,
            private_key: env::var("USER_PRIVATE_KEY").ok().filter(|s| !s.is_empty()),
            token: required_address("TARGET_TOKEN")?,
            weth: required_address("WETH")?,
            router: required_address("ROUTER")?,
            min_amount: env_decimal("MIN_AMT")
                .filter(|v| *v > dec!(0))
                .unwrap_or(DEFAULT_MIN_AMOUNT),
            buy_amount_mean: env_decimal("BUY_AMT_MEAN")
                .filter(|v| *v > dec!(0))
                .unwrap_or(DEFAULT_BUY_AMOUNT_MEAN),
            enforce_price_impact: env_flag("ENFORCE_PRICE_IMPACT", false),
            safeguards: SafeguardConfig {
                max_slippage_percent: env_decimal("MAX_SLIPPAGE")
                    .filter(|v| *v > dec!(0))
                    .unwrap_or(defaults.max_slippage_percent),
                max_price_deviation_percent: env_decimal("MAX_PRICE_DEVIATION")
                    .filter(|v| *v > dec!(0))
                    .unwrap_or(defaults.max_price_deviation_percent),
                max_gas_price_gwei: env_decimal("MAX_GAS_PRICE")
                    .filter(|v| *v > dec!(0))
                    .unwrap_or(defaults.max_gas_price_gwei),
                ..defaults
            },
            retry: RetryConfig::swaps(),
            plan: TradePlan::default(),
            schedule_file: env::var("SCHEDULE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("next.json")),
            report_dir: env::var("REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output/reports")),
            send_file_report: env_flag("SEND_FILE_REPORT", true),
            telegram,
            email,
        })
    }

    pub fn trading(&self) -> TradingConfig {
        TradingConfig {
            wallet_address: self.wallet_address,
            token: self.token,
            weth: self.weth,
            router: self.router,
            min_amount: self.min_amount,
            buy_amount_mean: self.buy_amount_mean,
            enforce_price_impact: self.enforce_price_impact,
            plan: self.plan.clone(),
            retry: self.retry.clone(),
        }
    }
}

fn required(key: &str) -> BotResult<String> {
    env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| BotError::Config(format!("{} is required", key)))
}

fn required_address(key: &str) -> BotResult<Address> {
    let raw = required(key)?;
    Address::from_str(raw.trim())
        .map_err(|e| BotError::Config(format!("{} is not a valid address: {}", key, e)))
}

fn env_decimal(key: &str) -> Option<Decimal> {
    env::var(key)
        .ok()
        .and_then(|s| Decimal::from_str(s.trim()).ok())
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
