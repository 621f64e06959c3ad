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

use super::{error_line, surface_block};

pub fn render(f: &mut Frame, app: &AppState, surface: &CalendarAdapter, focused: bool, area: ratatui::layout::Rect) {
    let layout = grid_view::month_layout(surface.slots(), app.selected_date, app.today());

    let month_name = layout
        .month
        .first_day()
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| layout.month.to_string());

    let mut lines = Vec::new();
    lines.extend(error_line(app, surface));
    lines.push(Line::from(vec![Span::styled(
        month_name,
        Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD),
    )]));
    lines.push(Line::from(""));
    lines.push(Line::from(
        ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
            .iter()
            .map(|name| Span::styled(format!(" {:<7}", name), Style::default().fg(app.theme.weekday_header)))
            .collect::<Vec<_>>(),
    ));

    for week in &layout.weeks {
        let mut day_spans = Vec::new();
        let mut count_spans = Vec::new();

        for day in week {
            let mut style = Style::default();
            if !day.in_month {
                style = style.fg(app.theme.inactive_day);
            } else if day.is_selected {
                style = style.bg(app.theme.selected_bg).fg(app.theme.selected_fg).add_modifier(Modifier::BOLD);
            } else if day.is_today {
                style = style.fg(app.theme.today).add_modifier(Modifier::BOLD);
            }
            day_spans.push(Span::styled(format!(" {:>2}     ", day.date.day()), style));

            let (text, color) = if !day.in_month {
                (String::new(), app.theme.inactive_day)
            } else if day.open > 0 {
                (format!("{} libre", day.open), app.theme.available)
            } else if day.booked > 0 {
                (format!("{} res.", day.booked), app.theme.booked)
            } else {
                (String::new(), app.theme.not_available)
            };
            count_spans.push(Span::styled(format!(" {:<7}", text), Style::default().fg(color)));
        }

        lines.push(Line::from(day_spans));
        lines.push(Line::from(count_spans));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("hjkl", Style::default().fg(app.theme.title)),
        Span::raw(" = Navigate | "),
        Span::styled("{ }", Style::default().fg(app.theme.title)),
        Span::raw(" = Month | "),
        Span::styled("Enter", Style::default().fg(app.theme.success)),
        Span::raw(" = Day view"),
    ]));

    let content = Paragraph::new(lines).block(surface_block(app, surface, focused));
    f.render_widget(content, area);
}
