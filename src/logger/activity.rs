//! Shared activity-log handle used by the dashboard loop and the fetch workers.
//!
//! Wraps one [`JsonlWriter`] behind a `parking_lot::Mutex`; clones share the
//! same file. Helper methods build the entry for each event the dashboard
//! records so call sites stay one line long.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::config::Config;
use crate::core::errors::SvcError;
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// Cheaply-cloneable handle onto the activity log.
#[derive(Clone)]
pub struct ActivityLog {
    inner: Arc<Mutex<JsonlWriter>>,
}

impl ActivityLog {
    /// Open the log described by `config`, or a discarding log when disabled.
    pub fn from_config(config: &Config) -> Self {
        if !config.logging.enabled {
            return Self::disabled();
        }
        Self::open(JsonlConfig {
            path: config.paths.activity_log.clone(),
            fallback_path: Some(fallback_path()),
            max_size_bytes: config.logging.max_size_bytes,
            max_rotated_files: config.logging.max_rotated_files,
            fsync_interval_secs: 10,
        })
    }

    pub fn open(config: JsonlConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(JsonlWriter::open(config))),
        }
    }

    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(Mutex::new(JsonlWriter::discarding())),
        }
    }

    /// Degradation state of the underlying writer.
    pub fn state(&self) -> String {
        self.inner.lock().state().to_string()
    }

    pub fn record(&self, entry: &LogEntry) {
        self.inner.lock().write_entry(entry);
    }

    pub fn flush(&self) {
        self.inner.lock().flush();
    }

    pub fn dashboard_started(&self, unit_count: usize, config_hash: &str) {
        let mut entry = LogEntry::new(EventType::DashboardStart, Severity::Info);
        entry.details = Some(format!(
            "version={} units={unit_count} config_hash={config_hash}",
            env!("CARGO_PKG_VERSION")
        ));
        self.record(&entry);
    }

    pub fn dashboard_stopped(&self, reason: &str, uptime: Duration) {
        let mut entry = LogEntry::new(EventType::DashboardStop, Severity::Info);
        entry.details = Some(reason.to_string());
        entry.duration_ms = Some(millis(uptime));
        self.record(&entry);
        self.flush();
    }

    pub fn config_loaded(&self, path: &std::path::Path) {
        let mut entry = LogEntry::new(EventType::ConfigLoaded, Severity::Info);
        entry.details = Some(path.display().to_string());
        self.record(&entry);
    }

    pub fn fetch_failed(&self, unit: &str, error: &SvcError, elapsed: Duration) {
        let mut entry = LogEntry::new(EventType::FetchFailed, Severity::Warning);
        entry.unit = Some(unit.to_string());
        entry.duration_ms = Some(millis(elapsed));
        entry.error_code = Some(error.code().to_string());
        entry.error_message = Some(error.to_string());
        self.record(&entry);
    }

    pub fn fetch_recovered(&self, unit: &str) {
        let mut entry = LogEntry::new(EventType::FetchRecovered, Severity::Info);
        entry.unit = Some(unit.to_string());
        self.record(&entry);
    }

    pub fn resized(&self, rows: u16, cols: u16) {
        let mut entry = LogEntry::new(EventType::Resize, Severity::Info);
        entry.rows = Some(rows);
        entry.cols = Some(cols);
        self.record(&entry);
    }

    pub fn error(&self, error: &SvcError) {
        let mut entry = LogEntry::new(EventType::Error, Severity::Critical);
        entry.error_code = Some(error.code().to_string());
        entry.error_message = Some(error.to_string());
        self.record(&entry);
        self.flush();
    }
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog")
            .field("state", &self.state())
            .finish()
    }
}

/// RAM-backed fallback so a read-only home directory does not lose the log.
fn fallback_path() -> PathBuf {
    PathBuf::from("/dev/shm/svcmon-activity.jsonl")
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
