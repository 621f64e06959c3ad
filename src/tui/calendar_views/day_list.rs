use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use fixer_schedule::{
    app::AppState,
    calendar::SlotState,
    ui::{
        adapter::CalendarAdapter,
        day_list::{self, DayListEntry},
    },
};

use super::{error_line, scroll_offset, slot_style, surface_block};

pub fn render(f: &mut Frame, app: &AppState, surface: &CalendarAdapter, focused: bool, area: ratatui::layout::Rect) {
    let list = day_list::calculate_layout(surface.slots(), app.selected_date, app.cursor(), app.today());

    let mut title_style = Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD);
    if list.is_today {
        title_style = title_style.fg(app.theme.today);
    }

    let mut lines = Vec::new();
    lines.extend(error_line(app, surface));
    lines.push(Line::from(vec![Span::styled(list.title.clone(), title_style)]));
    lines.push(Line::from(""));

    let mut cursor_line = None;
    for entry in &list.entries {
        let time = Span::styled(
            format!("{:<15}", entry.time_label()),
            Style::default().fg(app.theme.inactive_day),
        );
        let line = match entry {
            DayListEntry::Slot(row) => {
                if row.is_cursor {
                    cursor_line = Some(lines.len());
                }
                let look = app.theme.slot_style(row.state, surface.viewer());
                let style = slot_style(app, row.state, surface.viewer(), row.is_cursor);
                if look.banner {
                    Line::from(vec![time, Span::styled(format!(" {:<24}", look.label), style)])
                } else {
                    Line::from(vec![time, Span::styled(look.label, style)])
                }
            }
            DayListEntry::Closed { .. } => {
                let look = app.theme.slot_style(SlotState::NotAvailable, surface.viewer());
                Line::from(vec![time, Span::styled(look.label, Style::default().fg(look.color))])
            }
        };
        lines.push(line);
    }

    let content = Paragraph::new(lines)
        .block(surface_block(app, surface, focused))
        .scroll((scroll_offset(cursor_line, area), 0));
    f.render_widget(content, area);
}
