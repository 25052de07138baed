//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Adding a keybinding is a
//! single match arm in [`handle_key_event`] plus a mention in the status bar
//! help text ([`crate::ui`]).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Rows moved by PageUp / PageDown.
const PAGE: usize = 10;

/// Process a single key event, updating app state accordingly.
///
/// Only key presses count, so holding a key or releasing it does not
/// trigger the action twice.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::PageDown => app.select_down_by(PAGE),
        KeyCode::PageUp => app.select_up_by(PAGE),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('c') => app.clear(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::sample_items;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn q_and_esc_quit() {
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            let mut app = App::new("");
            handle_key_event(&mut app, press(code));
            assert!(app.quit);
        }
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = App::new("");
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key_event(&mut app, release);
        assert!(!app.quit);
    }

    #[test]
    fn vim_keys_scroll() {
        let mut app = App::new("");
        app.merge_items(sample_items());

        handle_key_event(&mut app, press(KeyCode::Char('G')));
        assert_eq!(app.list_state.selected(), Some(2));
        handle_key_event(&mut app, press(KeyCode::Char('k')));
        assert_eq!(app.list_state.selected(), Some(1));
        handle_key_event(&mut app, press(KeyCode::Char('g')));
        assert_eq!(app.list_state.selected(), Some(0));
        handle_key_event(&mut app, press(KeyCode::PageDown));
        assert_eq!(app.list_state.selected(), Some(2));
    }

    #[test]
    fn c_clears_the_list() {
        let mut app = App::new("");
        app.merge_items(sample_items());
        handle_key_event(&mut app, press(KeyCode::Char('c')));
        assert!(app.items.is_empty());
    }
}
