//! Key routing for the dashboard.

#![allow(missing_docs)]

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Quit,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

/// Map a key press to a dashboard action; unbound keys are ignored.
#[must_use]
pub fn map_key(key: KeyEvent) -> Option<InputAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(InputAction::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(InputAction::Quit),
        KeyCode::Up | KeyCode::Char('k') => Some(InputAction::ScrollUp),
        KeyCode::Down | KeyCode::Char('j') => Some(InputAction::ScrollDown),
        KeyCode::PageUp => Some(InputAction::PageUp),
        KeyCode::PageDown => Some(InputAction::PageDown),
        KeyCode::Home => Some(InputAction::Top),
        KeyCode::End => Some(InputAction::Bottom),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quit_keys() {
        assert_eq!(map_key(key(KeyCode::Char('q'))), Some(InputAction::Quit));
        assert_eq!(map_key(key(KeyCode::Esc)), Some(InputAction::Quit));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(InputAction::Quit)
        );
    }

    #[test]
    fn scroll_keys() {
        assert_eq!(map_key(key(KeyCode::Up)), Some(InputAction::ScrollUp));
        assert_eq!(map_key(key(KeyCode::Char('k'))), Some(InputAction::ScrollUp));
        assert_eq!(map_key(key(KeyCode::Down)), Some(InputAction::ScrollDown));
        assert_eq!(map_key(key(KeyCode::Char('j'))), Some(InputAction::ScrollDown));
        assert_eq!(map_key(key(KeyCode::PageDown)), Some(InputAction::PageDown));
        assert_eq!(map_key(key(KeyCode::Home)), Some(InputAction::Top));
        assert_eq!(map_key(key(KeyCode::End)), Some(InputAction::Bottom));
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(map_key(key(KeyCode::Char('x'))), None);
        assert_eq!(map_key(key(KeyCode::Char('Q'))), None);
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)),
            None
        );
    }
}
