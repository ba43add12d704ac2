//! Bounded fetch fan-out: one in-flight query chain per unit, joined before render.
//!
//! Worker threads pull unit indices from a pre-filled work channel and send
//! `(index, outcome)` back on a results channel. The dashboard drains results
//! while it keeps checking for input; cancelling a round stops workers from
//! taking new units and drops the receiver so late results are discarded.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel as channel;

use crate::bus::fetcher::BusStateFetcher;
use crate::core::errors::Result;
use crate::core::units::{Unit, UnitSnapshot};

/// Outcome of fetching one unit.
#[derive(Debug)]
pub struct FetchResult {
    /// Position of the unit in argument order.
    pub index: usize,
    pub outcome: Result<UnitSnapshot>,
    pub elapsed: Duration,
}

/// Fetch one unit and time it.
pub fn fetch_timed(fetcher: &BusStateFetcher, index: usize, unit: &Unit) -> FetchResult {
    let started = Instant::now();
    let outcome = fetcher.fetch(unit);
    FetchResult {
        index,
        outcome,
        elapsed: started.elapsed(),
    }
}

// ──────────────────── pool ────────────────────

/// Spawns per-round worker threads for a fixed unit list.
#[derive(Debug, Clone)]
pub struct FetchPool {
    fetcher: BusStateFetcher,
    workers: usize,
}

impl FetchPool {
    #[must_use]
    pub fn new(fetcher: BusStateFetcher, workers: usize) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
        }
    }

    /// With a single worker the dashboard fetches inline on its own thread.
    #[must_use]
    pub const fn is_sequential(&self) -> bool {
        self.workers == 1
    }

    #[must_use]
    pub const fn fetcher(&self) -> &BusStateFetcher {
        &self.fetcher
    }

    /// Start fetching every unit; results arrive in completion order.
    #[must_use]
    pub fn start(&self, units: &Arc<[Unit]>) -> FetchRound {
        let total = units.len();
        let cancel = Arc::new(AtomicBool::new(false));
        let (work_tx, work_rx) = channel::bounded::<usize>(total.max(1));
        let (result_tx, result_rx) = channel::unbounded::<FetchResult>();

        for index in 0..total {
            let _ = work_tx.send(index);
        }
        drop(work_tx);

        for _ in 0..self.workers.min(total) {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let cancel = Arc::clone(&cancel);
            let fetcher = self.fetcher.clone();
            let units = Arc::clone(units);

            thread::spawn(move || {
                fetch_worker(&work_rx, &result_tx, &cancel, &fetcher, &units);
            });
        }

        FetchRound {
            results: result_rx,
            cancel,
            expected: total,
            received: 0,
        }
    }
}

fn fetch_worker(
    work_rx: &channel::Receiver<usize>,
    result_tx: &channel::Sender<FetchResult>,
    cancel: &AtomicBool,
    fetcher: &BusStateFetcher,
    units: &[Unit],
) {
    while !cancel.load(Ordering::Relaxed) {
        let Ok(index) = work_rx.try_recv() else {
            return;
        };
        let result = fetch_timed(fetcher, index, &units[index]);
        if cancel.load(Ordering::Relaxed) || result_tx.send(result).is_err() {
            return;
        }
    }
}

// ──────────────────── round ────────────────────

/// What a poll of an in-flight round produced.
#[derive(Debug)]
pub enum RoundPoll {
    Ready(FetchResult),
    Pending,
    /// Every unit has reported, or all workers have gone away.
    Done,
}

/// Handle on one in-flight fan-out round.
#[derive(Debug)]
pub struct FetchRound {
    results: channel::Receiver<FetchResult>,
    cancel: Arc<AtomicBool>,
    expected: usize,
    received: usize,
}

impl FetchRound {
    /// Wait up to `timeout` for the next result.
    pub fn poll(&mut self, timeout: Duration) -> RoundPoll {
        if self.received >= self.expected {
            return RoundPoll::Done;
        }
        match self.results.recv_timeout(timeout) {
            Ok(result) => {
                self.received += 1;
                RoundPoll::Ready(result)
            }
            Err(channel::RecvTimeoutError::Timeout) => RoundPoll::Pending,
            Err(channel::RecvTimeoutError::Disconnected) => RoundPoll::Done,
        }
    }

    #[must_use]
    pub const fn received(&self) -> usize {
        self.received
    }

    /// Stop workers from taking more units and discard anything still in flight.
    pub fn cancel(self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

impl Drop for FetchRound {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

// ──────────────────── tests ────────────────────
