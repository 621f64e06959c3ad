use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use fixer_schedule::{
    app::AppState,
    ui::{adapter::CalendarAdapter, week_list},
};

use super::{error_line, scroll_offset, slot_style, surface_block};

pub fn render(f: &mut Frame, app: &AppState, surface: &CalendarAdapter, focused: bool, area: ratatui::layout::Rect) {
    let list = week_list::calculate_layout(surface.slots(), app.selected_date, app.cursor(), app.today());

    let mut lines = Vec::new();
    lines.extend(error_line(app, surface));
    lines.push(Line::from(vec![Span::styled(
        list.title.clone(),
        Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD),
    )]));

    let mut cursor_line = None;
    for day in &list.days {
        lines.push(Line::from(""));
        let mut header_style = Style::default().fg(app.theme.weekday_header).add_modifier(Modifier::BOLD);
        if day.is_selected {
            header_style = header_style.bg(app.theme.selected_bg).fg(app.theme.selected_fg);
        } else if day.is_today {
            header_style = header_style.fg(app.theme.today);
        }
        lines.push(Line::from(vec![
            Span::styled(day.label.clone(), header_style),
            Span::styled(
                format!("  {} libre(s)", day.open_count()),
                Style::default().fg(app.theme.inactive_day),
            ),
        ]));

        if day.rows.is_empty() {
            lines.push(Line::from(vec![Span::styled(
                "  Sin horarios",
                Style::default().fg(app.theme.not_available),
            )]));
            continue;
        }

        for row in &day.rows {
            if row.is_cursor {
                cursor_line = Some(lines.len());
            }
            let look = app.theme.slot_style(row.state, surface.viewer());
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<15}", row.time_label), Style::default().fg(app.theme.inactive_day)),
                Span::styled(look.label, slot_style(app, row.state, surface.viewer(), row.is_cursor)),
            ]));
        }
    }

    let content = Paragraph::new(lines)
        .block(surface_block(app, surface, focused))
        .scroll((scroll_offset(cursor_line, area), 0));
    f.render_widget(content, area);
}
