//! Terminal dashboard: classification, layout, the scrollable viewport and
//! the event loop that drives them.

pub mod classify;
pub mod event_loop;
pub mod input;
pub mod layout;
pub mod resize;
pub mod terminal;
pub mod theme;
pub mod viewport;
