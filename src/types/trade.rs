//! Trade state and persisted schedule types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    #[default]
    #[serde(alias = "")]
    None,
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::None => write!(f, "none"),
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

/// In-memory trading state owned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TradeState {
    pub last_action: TradeAction,
    pub trade_count: u64,
    /// Native amount bought by the current unsold tranche group.
    pub last_buy_total: Decimal,
    pub last_buy_time: Option<DateTime<Utc>>,
}

impl TradeState {
    pub fn should_buy(&self) -> bool {
        self.last_action != TradeAction::Buy
    }

    pub fn record_buy(&mut self, amount: Decimal, at: DateTime<Utc>) {
        self.last_action = TradeAction::Buy;
        self.trade_count += 1;
        self.last_buy_total += amount;
        self.last_buy_time = Some(at);
    }

    pub fn record_sell(&mut self) {
        self.last_action = TradeAction::Sell;
        self.trade_count += 1;
        self.last_buy_total = Decimal::ZERO;
        self.last_buy_time = None;
    }

    pub fn to_schedule(&self, next_trade_at: DateTime<Utc>) -> ScheduledTrade {
        let holding = self.last_action == TradeAction::Buy;
        ScheduledTrade {
            next_trade_at,
            last_action: self.last_action,
            trade_count: self.trade_count,
            last_buy_total: holding.then_some(self.last_buy_total),
            last_buy_time: if holding { self.last_buy_time } else { None },
        }
    }

    pub fn from_schedule(record: &ScheduledTrade) -> Self {
        Self {
            last_action: record.last_action,
            trade_count: record.trade_count,
            last_buy_total: record.last_buy_total.unwrap_or(Decimal::ZERO),
            last_buy_time: record.last_buy_time,
        }
    }
}

/// Durable projection of [`TradeState`] plus the next wake-up instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTrade {
    #[serde(rename = "nextTrade")]
    pub next_trade_at: DateTime<Utc>,
    #[serde(rename = "lastAction", default)]
    pub last_action: TradeAction,
    #[serde(rename = "count", default)]
    pub trade_count: u64,
    #[serde(rename = "lastBuyTotal", default, skip_serializing_if = "Option::is_none")]
    pub last_buy_total: Option<Decimal>,
    #[serde(rename = "lastBuyTime", default, skip_serializing_if = "Option::is_none")]
    pub last_buy_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrchestratorPhase {
    Idle,
    BuySequence,
    AwaitingSellWindow,
    SellSequence,
}

/// Result of one buy or sell sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceOutcome {
    Completed { trades: u32, amount: Decimal, tx_hashes: Vec<String> },
    /// The sell window has not opened yet.
    NotReady { ready_at: Option<DateTime<Utc>> },
    Failed { reason: String },
}
