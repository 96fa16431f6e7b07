//! Fire-and-forget trade report delivery

pub mod console;
pub mod email;
pub mod telegram;
pub mod file;

pub use console::*;
pub use email::*;
pub use telegram::*;
pub use file::*;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::{errors::BotResult, types::TradeReport};

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, report: &TradeReport) -> BotResult<()>;
}

/// Hands the report to every notifier on its own task. Failures are logged
/// and never reach the caller.
pub fn dispatch(notifiers: &[Arc<dyn Notifier>], report: &TradeReport) {
    for notifier in notifiers {
        let notifier = Arc::clone(notifier);
        let report = report.clone();
        tokio::spawn(async move {
            match notifier.send(&report).await {
                Ok(()) => debug!(notifier = notifier.name(), report_id = %report.id, "Report delivered"),
                Err(e) => warn!(notifier = notifier.name(), error = %e, "Failed to deliver trade report"),
            }
        });
    }
}
