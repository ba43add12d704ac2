//! LayoutEngine: unit index -> buffer anchor.
//!
//! Two units per row band. Each band is [`BAND_HEIGHT`] lines tall; a unit
//! block uses the first [`BLOCK_HEIGHT`] of them (name line plus one line per
//! status category).

#![allow(missing_docs)]

/// Lines between the tops of consecutive row bands.
pub const BAND_HEIGHT: u16 = 6;
/// Lines written per unit block.
pub const BLOCK_HEIGHT: u16 = 5;

/// Anchor `(row, col)` of the block for the unit at `index`.
///
/// Even indices sit in the left half, odd indices at `screen_cols / 2`.
#[must_use]
pub fn place(index: usize, screen_cols: u16) -> (usize, u16) {
    let row = (index / 2) * usize::from(BAND_HEIGHT);
    let col = if index % 2 == 0 { 0 } else { screen_cols / 2 };
    (row, col)
}

/// Columns available to the block anchored at `col`.
#[must_use]
pub const fn block_width(col: u16, screen_cols: u16) -> u16 {
    if col == 0 {
        screen_cols / 2
    } else {
        screen_cols.saturating_sub(col)
    }
}
