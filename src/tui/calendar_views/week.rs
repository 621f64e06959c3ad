use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use chrono::Datelike;
use fixer_schedule::{
    app::AppState,
    ui::{adapter::CalendarAdapter, grid_view},
};

use super::{error_line, fit, slot_style, surface_block};

const CELL_WIDTH: usize = 11;

pub fn render(f: &mut Frame, app: &AppState, surface: &CalendarAdapter, focused: bool, area: ratatui::layout::Rect) {
    let hours = app.business_hours();
    let layout = grid_view::week_layout(
        surface.slots(),
        app.selected_date,
        app.cursor(),
        app.today(),
        &hours,
    );

    let week_range = match layout.days.last() {
        Some(last_day) => format!("{} - {}", layout.week_start.format("%b %d"), last_day.date.format("%b %d, %Y")),
        None => layout.week_start.format("%b %d, %Y").to_string(),
    };

    let mut lines = Vec::new();
    lines.extend(error_line(app, surface));
    lines.push(Line::from(vec![Span::styled(
        week_range,
        Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD),
    )]));
    lines.push(Line::from(""));

    let mut header_spans = vec![Span::raw("      ")];
    for day in &layout.days {
        let style = if day.is_selected {
            Style::default().bg(app.theme.selected_bg).fg(app.theme.selected_fg)
        } else if day.is_today {
            Style::default().fg(app.theme.today).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.weekday_header)
        };
        let label = format!("{} {}", day.date.format("%a"), day.date.day());
        header_spans.push(Span::styled(fit(&label, CELL_WIDTH), style));
    }
    lines.push(Line::from(header_spans));

    for hour in &layout.hours {
        let mut row = vec![Span::styled(format!("{:02}:00 ", hour), Style::default().fg(app.theme.inactive_day))];
        for day in &layout.days {
            match day.cells.iter().find(|cell| cell.hour == *hour) {
                Some(cell) => {
                    let look = app.theme.slot_style(cell.state, surface.viewer());
                    row.push(Span::styled(
                        fit(look.label, CELL_WIDTH),
                        slot_style(app, cell.state, surface.viewer(), cell.is_cursor),
                    ));
                }
                None => row.push(Span::raw(fit("", CELL_WIDTH))),
            }
        }
        lines.push(Line::from(row));
    }

    let content = Paragraph::new(lines).block(surface_block(app, surface, focused));
    f.render_widget(content, area);
}
