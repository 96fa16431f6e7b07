//! Trade report storage

use anyhow::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use crate::types::TradeReport;

pub fn save_trade_report(dir: &Path, report: &TradeReport) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let filename = dir.join(format!("trades_{}.jsonl", Utc::now().format("%Y-%m-%d")));

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&filename)?;

    writeln!(file, "{}", serde_json::to_string(report)?)?;

    info!(
        report_id = %report.id,
        action = %report.action,
        success = report.success,
        "Saved trade report"
    );

    Ok(filename)
}
