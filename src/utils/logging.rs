//! Logging setup and configuration

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

pub const LOG_DIR: &str = "output/logs";
pub const LOG_FILE: &str = "volume-bot.log";

pub struct LoggingGuard {
    pub _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Console plus a daily rolling file; `json` switches the file layer to JSON lines.
pub fn setup_logging(json: bool) -> Result<Arc<LoggingGuard>> {
    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_level(true)
        .with_ansi(false);
    let file_layer = if json {
        file_layer.json().boxed()
    } else {
        file_layer.compact().boxed()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_ansi(true)
                .with_level(true)
        )
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse()?)
        )
        .init();

    Ok(Arc::new(LoggingGuard { _guard: guard }))
}

pub fn setup_output_directories(log_dir: &Path, report_dir: &Path, schedule_file: &Path) -> Result<()> {
    use std::fs;

    fs::create_dir_all(log_dir)?;
    fs::create_dir_all(report_dir)?;
    if let Some(parent) = schedule_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    Ok(())
}
