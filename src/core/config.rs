//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SvcError};
use crate::core::units::DEFAULT_SERVICE_SUFFIX;

/// Upper bound on concurrent bus queries in one refresh round.
pub const MAX_FETCH_WORKERS: usize = 64;

/// Full svcmon configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub dashboard: DashboardConfig,
    pub bus: BusConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Refresh cadence, input polling, and scroll buffer geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Minimum time between two bus fetch rounds. `0` refreshes continuously.
    pub refresh_interval_ms: u64,
    /// Blocking key-read timeout used once a round has been rendered.
    pub input_timeout_ms: u64,
    /// Fixed row capacity of the scroll buffer.
    pub buffer_rows: u16,
    /// Lines moved per Up/Down key.
    pub scroll_step: u16,
    /// Lines moved per PageUp/PageDown key.
    pub page_step: u16,
}

/// Control-bus access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BusConfig {
    pub service_suffix: String,
    /// Per-query deadline; expiry is reported as a fetch failure.
    pub query_timeout_ms: u64,
    /// Concurrent unit fetches per round. `1` fetches strictly sequentially.
    pub fetch_workers: usize,
    pub busctl_path: PathBuf,
    /// Query the per-user service manager instead of the system one.
    pub user_scope: bool,
}

/// Activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths used by svcmon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub activity_log: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1_000,
            input_timeout_ms: 10,
            buffer_rows: 201,
            scroll_step: 1,
            page_step: 6,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            service_suffix: DEFAULT_SERVICE_SUFFIX.to_string(),
            query_timeout_ms: 2_000,
            fetch_workers: 4,
            busctl_path: PathBuf::from("busctl"),
            user_scope: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[SVC-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("svcmon").join("config.toml"),
            activity_log: home_dir
                .join(".local")
                .join("share")
                .join("svcmon")
                .join("activity.jsonl"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, env_var)
    }

    fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SvcError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(SvcError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the activity log.
    ///
    /// FNV-1a over the canonical JSON form so the value is stable across runs.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // dashboard
        set_env(
            &mut lookup,
            "SVCMON_DASHBOARD_REFRESH_INTERVAL_MS",
            &mut self.dashboard.refresh_interval_ms,
        )?;
        set_env(
            &mut lookup,
            "SVCMON_DASHBOARD_INPUT_TIMEOUT_MS",
            &mut self.dashboard.input_timeout_ms,
        )?;
        set_env(
            &mut lookup,
            "SVCMON_DASHBOARD_BUFFER_ROWS",
            &mut self.dashboard.buffer_rows,
        )?;
        set_env(
            &mut lookup,
            "SVCMON_DASHBOARD_SCROLL_STEP",
            &mut self.dashboard.scroll_step,
        )?;
        set_env(
            &mut lookup,
            "SVCMON_DASHBOARD_PAGE_STEP",
            &mut self.dashboard.page_step,
        )?;

        // bus
        if let Some(raw) = lookup("SVCMON_BUS_SERVICE_SUFFIX") {
            self.bus.service_suffix = raw;
        }
        set_env(
            &mut lookup,
            "SVCMON_BUS_QUERY_TIMEOUT_MS",
            &mut self.bus.query_timeout_ms,
        )?;
        set_env(
            &mut lookup,
            "SVCMON_BUS_FETCH_WORKERS",
            &mut self.bus.fetch_workers,
        )?;
        if let Some(raw) = lookup("SVCMON_BUS_BUSCTL_PATH") {
            self.bus.busctl_path = PathBuf::from(raw);
        }
        set_env(&mut lookup, "SVCMON_BUS_USER_SCOPE", &mut self.bus.user_scope)?;

        // logging
        set_env(&mut lookup, "SVCMON_LOGGING_ENABLED", &mut self.logging.enabled)?;
        set_env(
            &mut lookup,
            "SVCMON_LOGGING_MAX_SIZE_BYTES",
            &mut self.logging.max_size_bytes,
        )?;
        set_env(
            &mut lookup,
            "SVCMON_LOGGING_MAX_ROTATED_FILES",
            &mut self.logging.max_rotated_files,
        )?;

        // paths
        if let Some(raw) = lookup("SVCMON_PATHS_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw);
        }

        Ok(())
    }

    /// Check cross-field invariants. Called by [`Config::load`] and again after
    /// CLI overrides are applied.
    pub fn validate(&self) -> Result<()> {
        let dash = &self.dashboard;
        if dash.buffer_rows == 0 {
            return Err(SvcError::InvalidConfig {
                details: "dashboard.buffer_rows must be >= 1".to_string(),
            });
        }
        if dash.scroll_step == 0 || dash.page_step == 0 {
            return Err(SvcError::InvalidConfig {
                details: "dashboard.scroll_step and dashboard.page_step must be >= 1".to_string(),
            });
        }
        if dash.refresh_interval_ms > 0 && dash.input_timeout_ms > dash.refresh_interval_ms {
            return Err(SvcError::InvalidConfig {
                details: format!(
                    "dashboard.input_timeout_ms ({}) must be <= dashboard.refresh_interval_ms ({})",
                    dash.input_timeout_ms, dash.refresh_interval_ms
                ),
            });
        }

        if dash.refresh_interval_ms > 0 && dash.input_timeout_ms == 0 {
            return Err(SvcError::InvalidConfig {
                details: "dashboard.input_timeout_ms must be >= 1 when refreshes are spaced out"
                    .to_string(),
            });
        }

        if self.bus.fetch_workers == 0 || self.bus.fetch_workers > MAX_FETCH_WORKERS {
            return Err(SvcError::InvalidConfig {
                details: format!(
                    "bus.fetch_workers must be in [1, {MAX_FETCH_WORKERS}], got {}",
                    self.bus.fetch_workers
                ),
            });
        }
        if self.bus.query_timeout_ms == 0 {
            return Err(SvcError::InvalidConfig {
                details: "bus.query_timeout_ms must be > 0".to_string(),
            });
        }
        if self.bus.service_suffix.trim().is_empty() {
            return Err(SvcError::InvalidConfig {
                details: "bus.service_suffix must not be empty".to_string(),
            });
        }

        if self.logging.enabled && self.logging.max_rotated_files == 0 {
            return Err(SvcError::InvalidConfig {
                details: "logging.max_rotated_files must be >= 1 when logging is enabled"
                    .to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_env<F, T>(lookup: &mut F, name: &str, slot: &mut T) -> Result<()>
where
    F: FnMut(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(name) {
        *slot = raw.trim().parse::<T>().map_err(|error| SvcError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}
