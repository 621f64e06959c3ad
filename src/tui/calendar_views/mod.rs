pub mod day;
pub mod day_list;
pub mod month;
pub mod week;
pub mod week_list;

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
};
use fixer_schedule::{
    app::AppState,
    calendar::{SlotState, Viewer},
    ui::adapter::CalendarAdapter,
};

pub(crate) fn fit(label: &str, width: usize) -> String {
    let cut: String = label.chars().take(width).collect();
    format!("{:<width$}", cut, width = width)
}

pub(crate) fn slot_style(app: &AppState, state: SlotState, viewer: &Viewer, is_cursor: bool) -> Style {
    let look = app.theme.slot_style(state, viewer);
    let mut style = Style::default().fg(look.color);
    if look.banner {
        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
    }
    if is_cursor {
        style = style.bg(app.theme.selected_bg).add_modifier(Modifier::BOLD);
        if look.banner {
            style = style.remove_modifier(Modifier::REVERSED);
        }
    }
    style
}

pub(crate) fn surface_block<'a>(app: &AppState, surface: &CalendarAdapter, focused: bool) -> Block<'a> {
    let mut title = format!(" {} ", surface.kind().name());
    if surface.is_loading() {
        title.push_str("(loading) ");
    }
    let border = if focused { app.theme.title } else { app.theme.inactive_day };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
}

pub(crate) fn scroll_offset(cursor_line: Option<usize>, area: ratatui::layout::Rect) -> u16 {
    let visible = area.height.saturating_sub(2) as usize;
    let offset = cursor_line
        .map(|line| line.saturating_sub(visible.saturating_sub(1)))
        .unwrap_or(0);
    u16::try_from(offset).unwrap_or(u16::MAX)
}

pub(crate) fn error_line<'a>(app: &AppState, surface: &CalendarAdapter) -> Option<Line<'a>> {
    surface.error().map(|message| {
        Line::from(vec![Span::styled(
            message.to_string(),
            Style::default().fg(app.theme.error).add_modifier(Modifier::BOLD),
        )])
    })
}
