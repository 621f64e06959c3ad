use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use fixer_schedule::{
    app::AppState,
    ui::{adapter::CalendarAdapter, grid_view},
};

use super::{error_line, slot_style, surface_block};

pub fn render(f: &mut Frame, app: &AppState, surface: &CalendarAdapter, focused: bool, area: ratatui::layout::Rect) {
    let hours: Vec<u32> = (0..24).collect();
    let layout = grid_view::day_layout(surface.slots(), app.selected_date, app.cursor(), app.today(), &hours);

    let mut title_style = Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD);
    if layout.is_today {
        title_style = title_style.fg(app.theme.today);
    }

    let mut lines = Vec::new();
    lines.extend(error_line(app, surface));
    lines.push(Line::from(vec![Span::styled(
        layout.date.format("%A, %B %d, %Y").to_string(),
        title_style,
    )]));
    lines.push(Line::from(""));

    // Keep the cursor on screen for short terminals.
    let visible = area.height.saturating_sub(5) as usize;
    let cursor_row = layout.cells.iter().position(|c| c.is_cursor).unwrap_or(0);
    let skip = cursor_row.saturating_sub(visible.saturating_sub(1));

    for cell in layout.cells.iter().skip(skip) {
        let look = app.theme.slot_style(cell.state, surface.viewer());
        let style = slot_style(app, cell.state, surface.viewer(), cell.is_cursor);
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:02}:00 - {:02}:00  ", cell.hour, cell.hour + 1),
                Style::default().fg(app.theme.inactive_day),
            ),
            Span::styled(look.label, style),
        ]));
    }

    let content = Paragraph::new(lines).block(surface_block(app, surface, focused));
    f.render_widget(content, area);
}
