#![forbid(unsafe_code)]

//! svcmon: a terminal dashboard for systemd service units.
//!
//! Polls the service manager for the load, active, sub and unit-file state of
//! a fixed list of services and renders them as a colorized, scrollable grid:
//! 1. **Bus**: unit resolution and property reads over the control bus
//! 2. **Dashboard**: classification, layout, viewport and the refresh loop
//! 3. **Logger**: append-only JSONL activity log
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use svcmon::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use svcmon::core::config::Config;
//! use svcmon::dashboard::classify::{Severity, classify};
//! ```

pub mod prelude;

pub mod bus;
pub mod core;
pub mod dashboard;
pub mod logger;

#[cfg(test)]
mod test_harness;
