use crossterm::event::KeyCode;

use crate::app::{AppState, Pane};
use crate::input::Action;
use crate::ui::adapter::{GridScale, SurfaceKind};

pub fn handle_key(key: KeyCode, state: &mut AppState) -> Action {
    match key {
        KeyCode::Char('h') | KeyCode::Left => state.move_days(-1),
        KeyCode::Char('l') | KeyCode::Right => state.move_days(1),
        KeyCode::Char('j') | KeyCode::Down => state.move_hours(1),
        KeyCode::Char('k') | KeyCode::Up => state.move_hours(-1),
        KeyCode::Char('J') => state.move_days(7),
        KeyCode::Char('K') => state.move_days(-7),
        KeyCode::Char('{') => state.move_months(-1),
        KeyCode::Char('}') => state.move_months(1),
        KeyCode::Char('t') => state.jump_to_today(),
        KeyCode::Char('m') => state.grid_scale = GridScale::Month,
        KeyCode::Char('w') => state.grid_scale = GridScale::Week,
        KeyCode::Char('d') => state.grid_scale = GridScale::Day,
        KeyCode::Char('D') => state.mobile_kind = SurfaceKind::MobileDay,
        KeyCode::Char('W') => state.mobile_kind = SurfaceKind::MobileWeek,
        KeyCode::Tab => state.toggle_focus(),
        KeyCode::Enter => return handle_enter_key(state),
        KeyCode::Char('r') => return Action::Refresh,
        KeyCode::Esc if state.picking_reschedule => return Action::CloseDialog,
        KeyCode::Char('q') => return Action::Quit,
        _ => {}
    }
    Action::None
}

fn handle_enter_key(state: &mut AppState) -> Action {
    if state.focus == Pane::Grid && state.grid_scale == GridScale::Month {
        state.grid_scale = GridScale::Day;
        return Action::None;
    }
    Action::Activate
}
