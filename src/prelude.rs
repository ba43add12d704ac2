//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use svcmon::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, SvcError};
pub use crate::core::units::{StateCategory, Unit, UnitSnapshot};

// Bus
pub use crate::bus::busctl::BusctlBus;
pub use crate::bus::fetcher::BusStateFetcher;
pub use crate::bus::pool::FetchPool;
pub use crate::bus::{ControlBus, UnitObject};

// Dashboard
pub use crate::dashboard::classify::{Severity, classify};
pub use crate::dashboard::event_loop::{Dashboard, LoopOptions, RunState};
pub use crate::dashboard::layout::place;
pub use crate::dashboard::resize::ResizeFlag;
pub use crate::dashboard::terminal::{CrosstermSurface, TerminalGuard, TerminalSurface};
pub use crate::dashboard::viewport::Viewport;

// Logger
pub use crate::logger::activity::ActivityLog;
