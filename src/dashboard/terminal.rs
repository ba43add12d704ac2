//! Terminal collaborator: the drawing/input seam and its crossterm backend.
//!
//! [`TerminalGuard`] enters raw mode and the alternate screen on construction
//! and restores the terminal on [`Drop`], including during panics: a panic hook
//! restores cooked mode before the default panic message prints.

#![allow(missing_docs)]

use std::io::{self, Stdout, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use crossterm::style::{Attribute, Print, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::core::errors::{Result, SvcError};
use crate::dashboard::resize::ResizeFlag;
use crate::dashboard::theme::{CellStyle, Theme};
use crate::dashboard::viewport::Cell;

/// Draw and input primitives the dashboard consumes.
pub trait TerminalSurface {
    /// Current `(cols, rows)`.
    fn size(&self) -> Result<(u16, u16)>;

    /// Draw `window` at the top-left of the screen, one pad row per screen row.
    fn present(&mut self, window: &[Vec<Cell>]) -> Result<()>;

    /// Wait up to `timeout` for a key press. `Duration::ZERO` never blocks.
    fn read_key(&mut self, timeout: Duration) -> Result<Option<KeyEvent>>;
}

// ──────────────────── crossterm surface ────────────────────

/// Real terminal on stdout.
pub struct CrosstermSurface {
    stdout: Stdout,
    theme: Theme,
    resize: ResizeFlag,
}

impl CrosstermSurface {
    #[must_use]
    pub fn new(theme: Theme, resize: ResizeFlag) -> Self {
        Self {
            stdout: io::stdout(),
            theme,
            resize,
        }
    }

    fn queue_run(&mut self, text: &str, style: CellStyle) -> io::Result<()> {
        let look = self.theme.look(style);
        queue!(self.stdout, SetAttribute(Attribute::Reset))?;
        if let Some(fg) = look.fg {
            queue!(self.stdout, SetForegroundColor(fg))?;
        }
        if look.bold {
            queue!(self.stdout, SetAttribute(Attribute::Bold))?;
        }
        queue!(self.stdout, Print(text))
    }

    fn draw(&mut self, window: &[Vec<Cell>]) -> io::Result<()> {
        let (_, rows) = terminal::size()?;
        let mut run = String::new();

        for (y, line) in (0..rows).zip(window) {
            queue!(self.stdout, MoveTo(0, y))?;
            let mut run_style = CellStyle::Plain;
            for cell in line {
                if cell.style != run_style && !run.is_empty() {
                    self.queue_run(&run, run_style)?;
                    run.clear();
                }
                run_style = cell.style;
                run.push(cell.ch);
            }
            if !run.is_empty() {
                self.queue_run(&run, run_style)?;
                run.clear();
            }
        }

        let drawn = u16::try_from(window.len()).unwrap_or(u16::MAX);
        for y in drawn..rows {
            queue!(self.stdout, MoveTo(0, y), Clear(ClearType::CurrentLine))?;
        }

        queue!(self.stdout, SetAttribute(Attribute::Reset))?;
        self.stdout.flush()
    }
}

impl TerminalSurface for CrosstermSurface {
    fn size(&self) -> Result<(u16, u16)> {
        terminal::size().map_err(|e| SvcError::terminal("size query", e))
    }

    fn present(&mut self, window: &[Vec<Cell>]) -> Result<()> {
        self.draw(window)
            .map_err(|e| SvcError::terminal("present", e))
    }

    fn read_key(&mut self, timeout: Duration) -> Result<Option<KeyEvent>> {
        if !event::poll(timeout).map_err(|e| SvcError::terminal("input poll", e))? {
            return Ok(None);
        }
        match event::read().map_err(|e| SvcError::terminal("input read", e))? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
            // Handled on the loop's next turn, never inline.
            Event::Resize(_, _) => {
                self.resize.raise();
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

// ──────────────────── terminal guard ────────────────────

/// Set while raw mode is active. Checked by the panic hook.
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// RAII guard for raw mode and the alternate screen.
pub struct TerminalGuard {
    hook_installed: bool,
}

impl TerminalGuard {
    /// Enter raw mode and the alternate screen, installing a panic-safe cleanup hook.
    ///
    /// On partial failure whatever was set up is undone before returning.
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode().map_err(|e| SvcError::terminal("enable raw mode", e))?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);

        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            restore_terminal_best_effort();
            return Err(SvcError::terminal("enter alternate screen", e));
        }

        let prev = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_terminal_best_effort();
            prev(info);
        }));

        Ok(Self {
            hook_installed: true,
        })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal_best_effort();
        if self.hook_installed {
            // The previous hook moved into our closure; fall back to the default.
            let _ = panic::take_hook();
        }
    }
}

/// Leave the alternate screen, show the cursor and restore cooked mode.
/// Safe to call repeatedly.
fn restore_terminal_best_effort() {
    if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, SetAttribute(Attribute::Reset), Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = stdout.flush();
    }
}

// ──────────────────── tests ────────────────────
