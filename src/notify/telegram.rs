//! Telegram Bot API notifier

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use crate::{
    config::TelegramConfig,
    errors::{BotError, BotResult},
    notify::Notifier,
    types::TradeReport,
};

const TELEGRAM_API: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> BotResult<Self> {
        Self::with_api_base(config, TELEGRAM_API)
    }

    pub fn with_api_base(config: TelegramConfig, api_base: impl Into<String>) -> BotResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BotError::Network {
                message: "Failed to build HTTP client".to_string(),
                source: Some(e.into()),
            })?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            config,
        })
    }

    pub fn format_message(report: &TradeReport) -> String {
        let mut message = format!(
            "🤖 Trade Report: {}\n\n",
            report.timestamp.format("%d/%m/%Y, %H:%M:%S UTC")
        );
        message.push_str(&format!("Type: {}\n", report.action));
        message.push_str(&format!("Amount In: {}\n", report.amount_in));
        for tx_hash in &report.tx_hashes {
            message.push_str(&format!("Transaction: {}\n", tx_hash));
        }
        if let Some(balance) = report.native_balance {
            message.push_str(&format!("\nBalance: {} native\n", balance.round_dp(6)));
        }
        message.push_str(&format!("Success: {}\n", report.success));
        if let Some(error) = &report.error_message {
            message.push_str(&format!("Error: {}\n", error));
        }
        message.push_str(&format!("\nPrevious Trade: {}\n", report.previous_action));
        message.push_str(&format!("Next Trade: {}\n", report.next_trade.to_rfc3339()));
        message.push_str(&format!("Trade Count: {}\n", report.trade_count));
        message
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, report: &TradeReport) -> BotResult<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.config.bot_token);
        let mut body = json!({
            "chat_id": self.config.chat_id,
            "text": Self::format_message(report),
        });
        if let Some(thread_id) = &self.config.thread_id {
            body["message_thread_id"] = json!(thread_id);
        }

        let response = self.client.post(&url).json(&body).send().await
            .map_err(|e| BotError::Network {
                message: "Telegram request failed".to_string(),
                source: Some(e.into()),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::network(format!("Telegram API error: {} - {}", status, body)));
        }
        Ok(())
    }
}
