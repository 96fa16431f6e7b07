//! Persisted trade schedule

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use crate::{
    errors::{BotError, BotResult},
    types::ScheduledTrade,
};

pub trait ScheduleStore: Send + Sync {
    /// `None` means first launch.
    fn load(&self) -> BotResult<Option<ScheduledTrade>>;

    fn save(&self, record: &ScheduledTrade) -> BotResult<()>;
}

/// Single JSON record, replaced atomically on every save.
pub struct JsonScheduleStore {
    path: PathBuf,
}

impl JsonScheduleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, message: impl Into<String>, source: impl Into<anyhow::Error>) -> BotError {
        BotError::Persistence {
            path: self.path.clone(),
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl ScheduleStore for JsonScheduleStore {
    fn load(&self) -> BotResult<Option<ScheduledTrade>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No schedule record found");
                return Ok(None);
            }
            Err(e) => return Err(self.error("failed to read schedule", e)),
        };

        // Legacy first-launch records hold only `{"count": 0}`.
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| self.error("schedule is not valid JSON", e))?;
        if value.get("nextTrade").is_none() {
            return Ok(None);
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| self.error("schedule has an unexpected shape", e))
    }

    fn save(&self, record: &ScheduledTrade) -> BotResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.error("failed to create schedule directory", e))?;
        }

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| self.error("failed to encode schedule", e))?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp_path)
            .map_err(|e| self.error("failed to create temporary schedule", e))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| self.error("failed to write temporary schedule", e))?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .map_err(|e| self.error("failed to replace schedule", e))?;

        info!(
            next_trade = %record.next_trade_at,
            last_action = %record.last_action,
            count = record.trade_count,
            "Saved trade schedule"
        );
        Ok(())
    }
}

/// Keeps the record in memory; used by tests and dry runs.
#[derive(Default)]
pub struct MemoryScheduleStore {
    record: Mutex<Option<ScheduledTrade>>,
}

impl MemoryScheduleStore {
    pub fn with_record(record: ScheduledTrade) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }

    fn slot(&self) -> BotResult<MutexGuard<'_, Option<ScheduledTrade>>> {
        self.record.lock().map_err(|_| BotError::Persistence {
            path: PathBuf::from(":memory:"),
            message: "schedule lock poisoned".to_string(),
            source: None,
        })
    }
}

impl ScheduleStore for MemoryScheduleStore {
    fn load(&self) -> BotResult<Option<ScheduledTrade>> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, record: &ScheduledTrade) -> BotResult<()> {
        *self.slot()? = Some(record.clone());
        Ok(())
    }
}
