use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use fixer_schedule::{
    app::{Mode, Pane, StatusLevel},
    calendar::Viewer,
    ui::adapter::{GridScale, SurfaceKind},
};
use crate::tui::{calendar_views, dialogs, session::Session};

pub fn ui(f: &mut Frame, session: &Session) {
    let app = &session.app;

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(main_chunks[1]);

    let who = match session.machine.viewer() {
        Viewer::Fixer => "fixer".to_string(),
        Viewer::Requester { requester_id } => format!("requester {}", requester_id),
    };
    let mut title_text = format!(
        "fixer-schedule - {} ({}) - {} / {}",
        session.machine.fixer_id(),
        who,
        session.grid.kind().name(),
        session.mobile.kind().name(),
    );
    if app.picking_reschedule {
        title_text.push_str(" - pick the new slot");
    }

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, main_chunks[0]);

    let grid_focused = app.focus == Pane::Grid;
    match session.grid.kind() {
        SurfaceKind::Grid(GridScale::Month) => {
            calendar_views::month::render(f, app, &session.grid, grid_focused, content_chunks[0])
        }
        SurfaceKind::Grid(GridScale::Day) => {
            calendar_views::day::render(f, app, &session.grid, grid_focused, content_chunks[0])
        }
        _ => calendar_views::week::render(f, app, &session.grid, grid_focused, content_chunks[0]),
    }

    match session.mobile.kind() {
        SurfaceKind::MobileWeek => {
            calendar_views::week_list::render(f, app, &session.mobile, !grid_focused, content_chunks[1])
        }
        _ => calendar_views::day_list::render(f, app, &session.mobile, !grid_focused, content_chunks[1]),
    }

    let (status_text, status_color) = match &app.status {
        Some(message) => (
            message.text.clone(),
            match message.level {
                StatusLevel::Info => app.theme.status_bar,
                StatusLevel::Success => app.theme.success,
                StatusLevel::Error => app.theme.error,
            },
        ),
        None => (
            format!(
                "{} {:02}:00 | Enter = open slot | Tab = switch pane | m/w/d D/W = views | r = refresh | q = quit",
                app.selected_date.format("%a %d %b"),
                app.selected_hour
            ),
            app.theme.status_bar,
        ),
    };

    let status = Paragraph::new(status_text)
        .style(Style::default().fg(status_color))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, main_chunks[2]);

    match app.mode {
        Mode::Form => dialogs::booking_form::render(f, app, &session.machine),
        Mode::Justification => dialogs::justification::render(f, app, &session.machine),
        Mode::Notice => dialogs::notice::render(f, app),
        Mode::Normal => {}
    }
}
