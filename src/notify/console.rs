//! Notifier that echoes reports to the log

use async_trait::async_trait;
use crate::{
    errors::BotResult,
    notify::Notifier,
    types::TradeReport,
    utils::print_trade_report,
};

/// Echoes reports to the log.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(&self, report: &TradeReport) -> BotResult<()> {
        print_trade_report(report);
        Ok(())
    }
}
