use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use fixer_schedule::{
    app::AppState,
    scheduling::booking::{BookingMachine, BookingPhase},
};

use super::centered;

pub fn render(f: &mut Frame, app: &AppState, machine: &BookingMachine) {
    let BookingPhase::AwaitingJustification { appointment } = machine.phase() else {
        return;
    };

    let dialog_area = centered(f.size(), 64, 12);
    f.render_widget(Clear, dialog_area);

    let dialog_text = vec![
        Line::from(vec![Span::styled(
            "Cancel appointment?",
            Style::default().fg(app.theme.error).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::raw("Why is "),
            Span::styled(
                format!(
                    "{} on {}",
                    appointment.details.client,
                    appointment.starting_time.format("%a %d %b %H:%M")
                ),
                Style::default().fg(app.theme.booked).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" being cancelled?"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(app.theme.title)),
            Span::raw(app.justification.as_str()),
        ]),
        Line::from(""),
        Line::from("You will pick a new slot next."),
        Line::from(""),
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(app.theme.success)),
            Span::raw(" = Continue | "),
            Span::styled("Esc", Style::default().fg(app.theme.error)),
            Span::raw(" = Keep appointment"),
        ]),
    ];

    let dialog_paragraph = Paragraph::new(dialog_text)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(" Cancellation reason ")
            .style(Style::default().bg(Color::Black)))
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Center);

    f.render_widget(dialog_paragraph, dialog_area);
}
