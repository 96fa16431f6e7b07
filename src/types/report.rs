//! Trade report handed to notifiers

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use super::TradeAction;

#[derive(Debug, Clone, Serialize)]
pub struct TradeReport {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: TradeAction,
    pub success: bool,
    pub amount_in: Decimal,
    pub tx_hashes: Vec<String>,
    pub native_balance: Option<Decimal>,
    pub trade_count: u64,
    pub previous_action: TradeAction,
    pub next_trade: DateTime<Utc>,
    pub error_message: Option<String>,
}
