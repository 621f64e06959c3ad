use ratatui::{
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use fixer_schedule::{
    app::AppState,
    scheduling::{
        booking::{BookingMachine, BookingPhase},
        form::{AppointmentForm, ModalityInput},
        validation::FormField,
    },
};

use super::centered;

fn field_value(form: &AppointmentForm, field: FormField) -> String {
    match (field, &form.modality) {
        (FormField::Client, _) => form.client.clone(),
        (FormField::Contact, _) => form.contact.clone(),
        (FormField::Description, _) => form.description.clone(),
        (FormField::Modality, ModalityInput::Virtual { .. }) => "Virtual".to_string(),
        (FormField::Modality, ModalityInput::Presential { .. }) => "Presencial".to_string(),
        (FormField::MeetingLink, ModalityInput::Virtual { meeting_link }) => meeting_link.clone(),
        (FormField::Address, ModalityInput::Presential { address, .. }) => address.clone(),
        (FormField::Coordinates, ModalityInput::Presential { coordinates, .. }) => coordinates.clone(),
        _ => String::new(),
    }
}

pub fn render(f: &mut Frame, app: &AppState, machine: &BookingMachine) {
    let Some(form) = machine.form() else {
        return;
    };

    let (heading, editing) = match machine.phase() {
        BookingPhase::Editing { .. } => ("Edit appointment", true),
        BookingPhase::Rescheduling { .. } => ("Reschedule appointment", false),
        _ => ("Book appointment", false),
    };

    let fields = form.fields();
    let form_height = (fields.len() as u16) * 2 + 10;
    let form_area = centered(f.size(), 72, form_height);
    f.render_widget(Clear, form_area);

    let active_color = app.theme.selected_bg;
    let inactive_color = app.theme.inactive_day;
    let end = form.starting_time + chrono::Duration::hours(1);

    let mut form_text = vec![
        Line::from(vec![Span::styled(heading, Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD))]),
        Line::from(""),
        Line::from(vec![
            Span::styled("When: ", Style::default().fg(inactive_color)),
            Span::raw(format!(
                "{} - {}",
                form.starting_time.format("%a %d %b %Y %H:%M"),
                end.format("%H:%M")
            )),
        ]),
        Line::from(""),
    ];

    for field in fields {
        let label_color = if form.active_field == field { active_color } else { inactive_color };
        let mut spans = vec![
            Span::styled(format!("{}: ", field.label()), Style::default().fg(label_color)),
            Span::raw(field_value(form, field)),
        ];
        if field == FormField::Modality && form.active_field == field {
            spans.push(Span::styled(" [space to switch]", Style::default().fg(inactive_color)));
        }
        form_text.push(Line::from(spans));

        match form.errors.for_field(field) {
            Some(message) => form_text.push(Line::from(vec![Span::styled(
                format!("  {}", message),
                Style::default().fg(app.theme.error),
            )])),
            None => form_text.push(Line::from("")),
        }
    }

    let mut hints = vec![
        Span::styled("Tab", Style::default().fg(app.theme.title)),
        Span::raw(" = Next field | "),
        Span::styled("Enter", Style::default().fg(app.theme.success)),
        Span::raw(" = Save | "),
        Span::styled("Esc", Style::default().fg(app.theme.error)),
        Span::raw(" = Close"),
    ];
    if editing {
        hints.push(Span::raw(" | "));
        hints.push(Span::styled("Ctrl-x", Style::default().fg(app.theme.error)));
        hints.push(Span::raw(" = Cancel appointment"));
    }
    form_text.push(Line::from(hints));

    let form_paragraph = Paragraph::new(form_text)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", heading))
            .style(Style::default().bg(ratatui::style::Color::Black)))
        .alignment(Alignment::Left);

    f.render_widget(form_paragraph, form_area);
}
