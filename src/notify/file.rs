//! JSON-lines report sink

use async_trait::async_trait;
use std::path::PathBuf;
use crate::{
    errors::{BotError, BotResult},
    notify::Notifier,
    storage::save_trade_report,
    types::TradeReport,
};

pub struct FileReportNotifier {
    dir: PathBuf,
}

impl FileReportNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Notifier for FileReportNotifier {
    fn name(&self) -> &str {
        "file"
    }

    async fn send(&self, report: &TradeReport) -> BotResult<()> {
        let dir = self.dir.clone();
        let report = report.clone();
        tokio::task::spawn_blocking(move || save_trade_report(&dir, &report))
            .await
            .map_err(|e| BotError::Persistence {
                path: self.dir.clone(),
                message: "report writer panicked".to_string(),
                source: Some(e.into()),
            })?
            .map(|_| ())
            .map_err(|e| BotError::Persistence {
                path: self.dir.clone(),
                message: "failed to append trade report".to_string(),
                source: Some(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TradeAction;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn appends_one_line_per_report() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = FileReportNotifier::new(dir.path());
        let report = TradeReport {
            id: "r1".to_string(),
            timestamp: Utc::now(),
            action: TradeAction::Buy,
            success: true,
            amount_in: dec!(0.0054),
            tx_hashes: vec!["0xabc".to_string()],
            native_balance: Some(dec!(1)),
            trade_count: 3,
            previous_action: TradeAction::Sell,
            next_trade: Utc::now(),
            error_message: None,
        };

        notifier.send(&report).await.unwrap();
        notifier.send(&report).await.unwrap();

        let file = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap().path();
        let contents = std::fs::read_to_string(file).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("\"action\":\"buy\""));
    }
}
