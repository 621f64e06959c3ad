use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use fixer_schedule::app::AppState;

use super::centered;

pub fn render(f: &mut Frame, app: &AppState) {
    let Some(message) = &app.notice else {
        return;
    };

    let dialog_area = centered(f.size(), 56, 8);
    f.render_widget(Clear, dialog_area);

    let dialog_text = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            message.as_str(),
            Style::default().fg(app.theme.booked).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Any key", Style::default().fg(app.theme.title)),
            Span::raw(" = Dismiss"),
        ]),
    ];

    let dialog_paragraph = Paragraph::new(dialog_text)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(" Notice ")
            .style(Style::default().bg(Color::Black)))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    f.render_widget(dialog_paragraph, dialog_area);
}
