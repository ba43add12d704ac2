//! Dashboard palette and the `NO_COLOR` accessibility switch.

#![allow(missing_docs)]

use std::env;

use crossterm::style::Color;

use crate::dashboard::classify::Severity;

/// Color output mode for compatibility with `NO_COLOR` and `--no-color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Enabled,
    Disabled,
}

impl ColorMode {
    #[must_use]
    pub const fn from_no_color_flag(no_color: bool) -> Self {
        if no_color {
            Self::Disabled
        } else {
            Self::Enabled
        }
    }

    /// Disabled when the flag is set or `NO_COLOR` is present in the environment.
    #[must_use]
    pub fn resolve(no_color_flag: bool) -> Self {
        Self::from_no_color_flag(no_color_flag || env::var_os("NO_COLOR").is_some())
    }
}

/// Style of one buffer cell. Six pairs: the five status pairs plus fetch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellStyle {
    #[default]
    Plain,
    /// Unit-name lines.
    Info,
    Bad,
    Good,
    Warn,
    /// Values that could not be fetched this round.
    Error,
}

impl From<Severity> for CellStyle {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Neutral => Self::Plain,
            Severity::Good => Self::Good,
            Severity::Warn => Self::Warn,
            Severity::Bad => Self::Bad,
        }
    }
}

/// Concrete terminal attributes for a [`CellStyle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Look {
    pub fg: Option<Color>,
    pub bold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Theme {
    pub color: ColorMode,
}

impl Theme {
    #[must_use]
    pub const fn new(color: ColorMode) -> Self {
        Self { color }
    }

    #[must_use]
    pub const fn look(self, style: CellStyle) -> Look {
        let (fg, bold) = match style {
            CellStyle::Plain => (Color::White, false),
            CellStyle::Info => (Color::Blue, true),
            CellStyle::Bad => (Color::Red, true),
            CellStyle::Good => (Color::Green, true),
            CellStyle::Warn => (Color::Yellow, true),
            CellStyle::Error => (Color::Magenta, true),
        };
        match self.color {
            ColorMode::Enabled => Look { fg: Some(fg), bold },
            ColorMode::Disabled => Look { fg: None, bold },
        }
    }
}
