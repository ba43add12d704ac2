//! Viewport: the off-screen pad, the scroll offset and the visible window.
//!
//! The pad has a fixed number of rows chosen at construction and is always as
//! wide as the terminal. Only the window `[offset, offset + screen_rows)` is
//! ever presented; everything else survives scrolls and resizes untouched.

#![allow(missing_docs)]

use crate::core::errors::Result;
use crate::dashboard::terminal::TerminalSurface;
use crate::dashboard::theme::CellStyle;

/// One character cell of the pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: CellStyle,
}

impl Cell {
    pub const BLANK: Self = Self {
        ch: ' ',
        style: CellStyle::Plain,
    };
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

pub struct Viewport<S: TerminalSurface> {
    surface: S,
    pad: Vec<Vec<Cell>>,
    screen_rows: u16,
    screen_cols: u16,
    offset: usize,
}

impl<S: TerminalSurface> Viewport<S> {
    /// Allocate a `buffer_rows`-row pad sized to the surface's current width.
    pub fn new(surface: S, buffer_rows: u16) -> Result<Self> {
        let (cols, rows) = surface.size()?;
        let pad = vec![vec![Cell::BLANK; usize::from(cols)]; usize::from(buffer_rows)];
        Ok(Self {
            surface,
            pad,
            screen_rows: rows,
            screen_cols: cols,
            offset: 0,
        })
    }

    #[must_use]
    pub fn buffer_rows(&self) -> usize {
        self.pad.len()
    }

    #[must_use]
    pub const fn screen_rows(&self) -> u16 {
        self.screen_rows
    }

    #[must_use]
    pub const fn screen_cols(&self) -> u16 {
        self.screen_cols
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Largest offset that still shows a full screen of pad rows.
    #[must_use]
    pub fn max_offset(&self) -> usize {
        self.pad.len().saturating_sub(usize::from(self.screen_rows))
    }

    pub const fn surface(&self) -> &S {
        &self.surface
    }

    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Track new terminal dimensions, re-widen every pad row and redraw.
    ///
    /// The row count never changes; content beyond the new width is cut,
    /// new columns are blank.
    pub fn resize(&mut self, screen_rows: u16, screen_cols: u16) -> Result<()> {
        self.screen_rows = screen_rows;
        self.screen_cols = screen_cols;
        for row in &mut self.pad {
            row.resize(usize::from(screen_cols), Cell::BLANK);
        }
        self.offset = self.offset.min(self.max_offset());
        self.blit()
    }

    /// Move the window by `delta` rows, clamped to the pad. Returns whether it moved.
    pub fn scroll(&mut self, delta: isize) -> bool {
        let target = self
            .offset
            .saturating_add_signed(delta)
            .min(self.max_offset());
        let moved = target != self.offset;
        self.offset = target;
        moved
    }

    pub fn scroll_to_top(&mut self) -> bool {
        let moved = self.offset != 0;
        self.offset = 0;
        moved
    }

    pub fn scroll_to_bottom(&mut self) -> bool {
        let max = self.max_offset();
        let moved = self.offset != max;
        self.offset = max;
        moved
    }

    /// Present the visible window on the surface.
    pub fn blit(&mut self) -> Result<()> {
        let start = self.offset.min(self.pad.len());
        let end = (start + usize::from(self.screen_rows)).min(self.pad.len());
        self.surface.present(&self.pad[start..end])
    }

    /// Write `text` at pad coordinates; anything past the pad edge is dropped.
    pub fn write(&mut self, row: usize, col: u16, text: &str, style: CellStyle) {
        let Some(line) = self.pad.get_mut(row) else {
            return;
        };
        for (slot, ch) in line.iter_mut().skip(usize::from(col)).zip(text.chars()) {
            *slot = Cell { ch, style };
        }
    }

    /// Blank `width` cells starting at `(row, col)`.
    pub fn clear_span(&mut self, row: usize, col: u16, width: u16) {
        let Some(line) = self.pad.get_mut(row) else {
            return;
        };
        for slot in line
            .iter_mut()
            .skip(usize::from(col))
            .take(usize::from(width))
        {
            *slot = Cell::BLANK;
        }
    }

    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.pad.get(row).and_then(|line| line.get(col)).copied()
    }

    /// Text of one pad row with trailing blanks trimmed.
    #[must_use]
    pub fn row_text(&self, row: usize) -> String {
        self.pad
            .get(row)
            .map(|line| line.iter().map(|c| c.ch).collect::<String>())
            .unwrap_or_default()
            .trim_end()
            .to_string()
    }
}

// ──────────────────── tests ────────────────────
