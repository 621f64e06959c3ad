use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::AppState;
use crate::input::Action;
use crate::scheduling::form::AppointmentForm;

pub fn handle_form_key(key: KeyEvent, form: &mut AppointmentForm) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('x') => Action::CancelBooking,
            KeyCode::Char('t') => {
                form.toggle_modality();
                Action::None
            }
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        KeyCode::Enter => return Action::Submit,
        KeyCode::Esc => return Action::CloseDialog,
        _ => {}
    }
    Action::None
}

pub fn handle_justification_key(key: KeyEvent, state: &mut AppState) -> Action {
    match key.code {
        KeyCode::Char(c) => state.justification.push(c),
        KeyCode::Backspace => {
            state.justification.pop();
        }
        KeyCode::Enter => return Action::ConfirmJustification(state.justification.clone()),
        KeyCode::Esc => return Action::CloseDialog,
        _ => {}
    }
    Action::None
}
