//! SVC-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SvcError>;

/// Top-level error type for svcmon.
#[derive(Debug, Error)]
pub enum SvcError {
    #[error("[SVC-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SVC-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SVC-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SVC-2001] control bus unavailable: {details}")]
    BusConnect { details: String },

    #[error("[SVC-2002] bus query failed for {target}: {details}")]
    Bus { target: String, details: String },

    #[error("[SVC-2003] bus query timed out for {target} after {timeout_ms} ms")]
    BusTimeout { target: String, timeout_ms: u64 },

    #[error("[SVC-2004] malformed bus reply for {target}: {details}")]
    BusMalformed { target: String, details: String },

    #[error("[SVC-3001] terminal failure in {context}: {source}")]
    Terminal {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("[SVC-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[SVC-3003] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[SVC-3004] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[SVC-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl SvcError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SVC-1001",
            Self::MissingConfig { .. } => "SVC-1002",
            Self::ConfigParse { .. } => "SVC-1003",
            Self::BusConnect { .. } => "SVC-2001",
            Self::Bus { .. } => "SVC-2002",
            Self::BusTimeout { .. } => "SVC-2003",
            Self::BusMalformed { .. } => "SVC-2004",
            Self::Terminal { .. } => "SVC-3001",
            Self::Io { .. } => "SVC-3002",
            Self::Serialization { .. } => "SVC-3003",
            Self::ChannelClosed { .. } => "SVC-3004",
            Self::Runtime { .. } => "SVC-3900",
        }
    }

    /// Whether retrying on the next refresh round might resolve the failure.
    ///
    /// Per-unit fetch failures are retryable; they are rendered in place and the
    /// dashboard keeps running.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Bus { .. }
                | Self::BusTimeout { .. }
                | Self::BusMalformed { .. }
                | Self::ChannelClosed { .. }
                | Self::Io { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for terminal primitive failures.
    #[must_use]
    pub const fn terminal(context: &'static str, source: std::io::Error) -> Self {
        Self::Terminal { context, source }
    }
}

impl From<serde_json::Error> for SvcError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for SvcError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
