//! PendingResize: the one flag shared between the resize notification and the loop.
//!
//! The notification side only ever sets the flag; the dashboard clears it with
//! [`ResizeFlag::take`] on its own turn and performs the resize there.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct ResizeFlag {
    pending: Arc<AtomicBool>,
}

impl ResizeFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag raised by `SIGWINCH`.
    ///
    /// Registration is best-effort; crossterm resize events still raise the flag.
    #[must_use]
    pub fn with_signal() -> Self {
        let flag = Self::new();
        flag.register_signal();
        flag
    }

    #[cfg(all(unix, feature = "signals"))]
    fn register_signal(&self) {
        use signal_hook::consts::SIGWINCH;
        if let Err(e) = signal_hook::flag::register(SIGWINCH, Arc::clone(&self.pending)) {
            eprintln!("[SVC-SIGNAL] failed to register SIGWINCH: {e}");
        }
    }

    #[cfg(not(all(unix, feature = "signals")))]
    fn register_signal(&self) {}

    pub fn raise(&self) {
        self.pending.store(true, Ordering::Relaxed);
    }

    /// Check and clear.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Relaxed)
    }
}
