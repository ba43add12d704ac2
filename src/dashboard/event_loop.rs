//! Dashboard event loop: fetch, classify, place, write, blit, read input.
//!
//! One tick services a pending resize first, then runs a fetch round (inline
//! or fanned out), renders every unit in argument order, blits, and keeps
//! reading input until the refresh interval has elapsed. A quit key seen at
//! any input-check point ends the tick immediately; results of an unfinished
//! round are discarded.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::bus::pool::{FetchPool, FetchResult, RoundPoll, fetch_timed};
use crate::core::config::DashboardConfig;
use crate::core::errors::{Result, SvcError};
use crate::core::units::{StateCategory, Unit};
use crate::dashboard::classify::classify;
use crate::dashboard::input::{InputAction, map_key};
use crate::dashboard::layout::{BLOCK_HEIGHT, block_width, place};
use crate::dashboard::resize::ResizeFlag;
use crate::dashboard::terminal::TerminalSurface;
use crate::dashboard::theme::CellStyle;
use crate::dashboard::viewport::Viewport;
use crate::logger::activity::ActivityLog;

/// Value shown for every field of a unit whose fetch failed.
pub const UNKNOWN_VALUE: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Exiting,
}

/// Timing and scrolling knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOptions {
    pub refresh_interval: Duration,
    pub input_timeout: Duration,
    pub scroll_step: u16,
    pub page_step: u16,
}

impl From<&DashboardConfig> for LoopOptions {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            refresh_interval: Duration::from_millis(config.refresh_interval_ms),
            input_timeout: Duration::from_millis(config.input_timeout_ms),
            scroll_step: config.scroll_step,
            page_step: config.page_step,
        }
    }
}

pub struct Dashboard<S: TerminalSurface> {
    viewport: Viewport<S>,
    units: Arc<[Unit]>,
    pool: FetchPool,
    resize: ResizeFlag,
    log: ActivityLog,
    options: LoopOptions,
    state: RunState,
    /// Whether each unit's last fetch failed; drives failed/recovered log events.
    failing: Vec<bool>,
    rounds: u64,
}

impl<S: TerminalSurface> Dashboard<S> {
    #[must_use]
    pub fn new(
        viewport: Viewport<S>,
        units: Arc<[Unit]>,
        pool: FetchPool,
        resize: ResizeFlag,
        log: ActivityLog,
        options: LoopOptions,
    ) -> Self {
        let failing = vec![false; units.len()];
        Self {
            viewport,
            units,
            pool,
            resize,
            log,
            options,
            state: RunState::Running,
            failing,
            rounds: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Completed fetch rounds.
    #[must_use]
    pub const fn rounds(&self) -> u64 {
        self.rounds
    }

    pub const fn viewport(&self) -> &Viewport<S> {
        &self.viewport
    }

    pub const fn viewport_mut(&mut self) -> &mut Viewport<S> {
        &mut self.viewport
    }

    /// Tick until a quit key arrives. Terminal failures end the loop with an error.
    pub fn run(&mut self) -> Result<()> {
        while self.state == RunState::Running {
            self.tick()?;
        }
        Ok(())
    }

    /// One refresh cycle.
    pub fn tick(&mut self) -> Result<()> {
        self.service_resize()?;

        if !self.fetch_round()? {
            return Ok(());
        }
        self.rounds += 1;
        self.viewport.blit()?;

        self.wait_for_next_round()
    }

    // ──────────────────── resize ────────────────────

    fn service_resize(&mut self) -> Result<()> {
        if !self.resize.take() {
            return Ok(());
        }
        let (cols, rows) = self.viewport.surface().size()?;
        self.viewport.resize(rows, cols)?;
        self.log.resized(rows, cols);
        Ok(())
    }

    // ──────────────────── fetch ────────────────────

    /// Fetch and render every unit. Returns `false` when a quit cut the round short.
    fn fetch_round(&mut self) -> Result<bool> {
        if self.pool.is_sequential() {
            self.fetch_sequential()
        } else {
            self.fetch_fanned_out()
        }
    }

    fn fetch_sequential(&mut self) -> Result<bool> {
        for index in 0..self.units.len() {
            self.check_input(Duration::ZERO)?;
            if self.state == RunState::Exiting {
                return Ok(false);
            }
            let result = fetch_timed(self.pool.fetcher(), index, &self.units[index]);
            self.render_unit(result);
        }
        Ok(true)
    }

    fn fetch_fanned_out(&mut self) -> Result<bool> {
        let mut round = self.pool.start(&self.units);
        let mut results: Vec<Option<FetchResult>> =
            std::iter::repeat_with(|| None).take(self.units.len()).collect();

        loop {
            self.check_input(Duration::ZERO)?;
            if self.state == RunState::Exiting {
                round.cancel();
                return Ok(false);
            }
            match round.poll(self.options.input_timeout) {
                RoundPoll::Ready(result) => {
                    let index = result.index;
                    results[index] = Some(result);
                }
                RoundPoll::Pending => {}
                RoundPoll::Done => break,
            }
        }

        for (index, slot) in results.into_iter().enumerate() {
            let result = slot.unwrap_or_else(|| FetchResult {
                index,
                outcome: Err(SvcError::ChannelClosed {
                    component: "fetch pool",
                }),
                elapsed: Duration::ZERO,
            });
            self.render_unit(result);
        }
        Ok(true)
    }

    // ──────────────────── render ────────────────────

    fn render_unit(&mut self, result: FetchResult) {
        let FetchResult {
            index,
            outcome,
            elapsed,
        } = result;
        let unit = &self.units[index];
        let screen_cols = self.viewport.screen_cols();
        let (row, col) = place(index, screen_cols);
        let width = block_width(col, screen_cols);
        // The two halves tile a band line. A left block without a right
        // neighbour also owns the right half.
        let alone_in_band = col == 0 && index + 1 == self.units.len();
        let clear_width = if alone_in_band { screen_cols } else { width };

        for line in 0..usize::from(BLOCK_HEIGHT) {
            self.viewport.clear_span(row + line, col, clear_width);
        }

        match outcome {
            Ok(snapshot) => {
                write_clipped(
                    &mut self.viewport,
                    row,
                    col,
                    width,
                    &[(unit.name.as_str(), CellStyle::Info)],
                );
                for (line, (category, value)) in snapshot.fields().enumerate() {
                    let style = CellStyle::from(classify(category, value));
                    write_clipped(
                        &mut self.viewport,
                        row + 1 + line,
                        col,
                        width,
                        &[(category.label(), CellStyle::Plain), (value, style)],
                    );
                }
                if std::mem::replace(&mut self.failing[index], false) {
                    self.log.fetch_recovered(&unit.name);
                }
            }
            Err(err) => {
                let suffix = format!(" (fetch failed: {})", err.code());
                write_clipped(
                    &mut self.viewport,
                    row,
                    col,
                    width,
                    &[
                        (unit.name.as_str(), CellStyle::Info),
                        (suffix.as_str(), CellStyle::Error),
                    ],
                );
                for (line, category) in StateCategory::ALL.into_iter().enumerate() {
                    write_clipped(
                        &mut self.viewport,
                        row + 1 + line,
                        col,
                        width,
                        &[
                            (category.label(), CellStyle::Plain),
                            (UNKNOWN_VALUE, CellStyle::Error),
                        ],
                    );
                }
                if !std::mem::replace(&mut self.failing[index], true) {
                    self.log.fetch_failed(&unit.name, &err, elapsed);
                }
            }
        }
    }

    // ──────────────────── input ────────────────────

    /// Keep servicing input until the refresh interval has elapsed.
    fn wait_for_next_round(&mut self) -> Result<()> {
        let deadline = Instant::now() + self.options.refresh_interval;
        loop {
            self.check_input(self.options.input_timeout)?;
            if self.state == RunState::Exiting || Instant::now() >= deadline {
                return Ok(());
            }
        }
    }

    /// One input-check point: pending resize, then at most one key.
    fn check_input(&mut self, timeout: Duration) -> Result<()> {
        self.service_resize()?;
        let Some(key) = self.viewport.surface_mut().read_key(timeout)? else {
            return Ok(());
        };
        if let Some(action) = map_key(key) {
            self.apply(action)?;
        }
        Ok(())
    }

    fn apply(&mut self, action: InputAction) -> Result<()> {
        let step = isize::try_from(self.options.scroll_step).unwrap_or(isize::MAX);
        let page = isize::try_from(self.options.page_step).unwrap_or(isize::MAX);
        let moved = match action {
            InputAction::Quit => {
                self.state = RunState::Exiting;
                return Ok(());
            }
            InputAction::ScrollUp => self.viewport.scroll(-step),
            InputAction::ScrollDown => self.viewport.scroll(step),
            InputAction::PageUp => self.viewport.scroll(-page),
            InputAction::PageDown => self.viewport.scroll(page),
            InputAction::Top => self.viewport.scroll_to_top(),
            InputAction::Bottom => self.viewport.scroll_to_bottom(),
        };
        if moved {
            self.viewport.blit()?;
        }
        Ok(())
    }
}

/// Write styled segments left to right, cut at `width` columns.
fn write_clipped<S: TerminalSurface>(
    viewport: &mut Viewport<S>,
    row: usize,
    col: u16,
    width: u16,
    segments: &[(&str, CellStyle)],
) {
    let mut used: u16 = 0;
    for &(text, style) in segments {
        let room = usize::from(width.saturating_sub(used));
        if room == 0 {
            return;
        }
        let clipped: String = text.chars().take(room).collect();
        let len = u16::try_from(clipped.chars().count()).unwrap_or(u16::MAX);
        viewport.write(row, col.saturating_add(used), &clipped, style);
        used = used.saturating_add(len);
    }
}
