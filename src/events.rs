use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::App;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If filter input is active, handle text input
    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    // The live module sees keys before the shell does
    if app.module_key(key) {
        return;
    }

    // History traversal, from anywhere
    match key.code {
        KeyCode::Char('[') => return app.go_back(),
        KeyCode::Char(']') => return app.go_forward(),
        KeyCode::Left if key.modifiers.contains(KeyModifiers::ALT) => return app.go_back(),
        KeyCode::Right if key.modifiers.contains(KeyModifiers::ALT) => return app.go_forward(),
        KeyCode::Char('?') => return app.toggle_help(),
        KeyCode::Char('q') => return app.quit(),
        _ => {}
    }

    if !app.in_catalog() {
        // Loading, module or error viewport: only the way back
        if matches!(key.code, KeyCode::Esc | KeyCode::Backspace) {
            app.return_home();
        }
        return;
    }

    match key.code {
        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Enter => app.open_selected(),

        // Category tabs
        KeyCode::Tab | KeyCode::BackTab => app.next_category(),

        // Filter (start typing to filter)
        KeyCode::Char('/') => app.start_filter(),

        // Clear filter
        KeyCode::Char('c') | KeyCode::Esc => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            }
        }

        _ => {}
    }
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Confirm filter
        KeyCode::Enter => {
            app.filter_active = false;
        }

        // Cancel filter (keep text but exit input mode)
        KeyCode::Esc => {
            app.cancel_filter();
        }

        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.filter_active = false;
            }
        }

        KeyCode::Char(c) => {
            app.filter_push(c);
        }

        _ => {}
    }
}

/// Handle a mouse event. `content_start_row` is the first screen row of the
/// catalog list, below its header row; the list may be scrolled.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    match mouse.kind {
        MouseEventKind::ScrollUp if app.in_catalog() => app.select_prev(),
        MouseEventKind::ScrollDown if app.in_catalog() => app.select_next(),

        // Click to select, click the selection again to open
        MouseEventKind::Down(MouseButton::Left) if app.in_catalog() => {
            if mouse.row < content_start_row {
                return;
            }
            let item_row = app.catalog_offset + (mouse.row - content_start_row) as usize;
            if item_row >= app.visible_modules().len() {
                return;
            }
            if item_row == app.selected_index {
                app.open_selected();
            } else {
                app.selected_index = item_row;
            }
        }

        // Right-click goes back
        MouseEventKind::Down(MouseButton::Right) => app.go_back(),

        _ => {}
    }
}
