use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{self, Event as TermEvent, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use fixer_schedule::{
    app::{AppState, Mode, Pane},
    input::{insert_mode, normal_mode, Action},
    scheduling::{BookingError, BookingMachine, SlotClock, SlotGenerator},
    storage::config::Config,
    sync::{AppointmentApi, AppointmentClient, SyncBridge, ViewportId, ViewportResponse},
    ui::{
        adapter::{CalendarAdapter, GridScale, SurfaceContext, SurfaceKind},
        theme::Theme,
    },
};
use crate::tui::presentation::ui;

const GRID_VIEWPORT: ViewportId = ViewportId(1);
const MOBILE_VIEWPORT: ViewportId = ViewportId(2);

pub struct Session {
    pub app: AppState,
    pub machine: BookingMachine,
    pub grid: CalendarAdapter,
    pub mobile: CalendarAdapter,
    responses: mpsc::UnboundedReceiver<ViewportResponse>,
}

impl Session {
    pub fn new(
        app: AppState,
        machine: BookingMachine,
        context: &SurfaceContext,
        responses: mpsc::UnboundedReceiver<ViewportResponse>,
    ) -> Self {
        let mut grid = CalendarAdapter::new(GRID_VIEWPORT, app.grid_kind(), app.selected_date, context);
        let mut mobile = CalendarAdapter::new(MOBILE_VIEWPORT, app.mobile_kind, app.selected_date, context);
        grid.mount();
        mobile.mount();
        Self { app, machine, grid, mobile, responses }
    }

    pub fn pump(&mut self) {
        while let Ok(response) = self.responses.try_recv() {
            if response.viewport == GRID_VIEWPORT {
                self.grid.handle_response(response);
            } else {
                self.mobile.handle_response(response);
            }
        }
        self.grid.poll_sync();
        self.mobile.poll_sync();
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        let action = match self.app.mode {
            Mode::Notice => {
                self.app.dismiss_notice();
                Action::None
            }
            Mode::Justification => insert_mode::handle_justification_key(key, &mut self.app),
            Mode::Form => match self.machine.form_mut() {
                Some(form) => insert_mode::handle_form_key(key, form),
                None => Action::CloseDialog,
            },
            Mode::Normal => {
                self.app.status = None;
                normal_mode::handle_key(key.code, &mut self.app)
            }
        };

        self.perform(action).await;
        self.app.sync_with(&self.machine);
        self.follow_cursor();
    }

    async fn perform(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => self.app.should_quit = true,
            Action::Refresh => {
                self.grid.refresh();
                self.mobile.refresh();
            }
            Action::CloseDialog => self.machine.close(),
            Action::Activate => {
                let Some(cursor) = self.app.cursor() else {
                    return;
                };
                let surface = match self.app.focus {
                    Pane::Grid => &self.grid,
                    Pane::Mobile => &self.mobile,
                };
                if let Err(e) = surface.activate(cursor, &mut self.machine).await {
                    self.fail(e);
                }
            }
            Action::Submit => match self.machine.submit().await {
                Ok(outcome) => self.app.report_outcome(&outcome),
                Err(e) => self.fail(e),
            },
            Action::CancelBooking => match self.machine.request_cancel_current() {
                Ok(()) => self.app.set_info("Type the reason for the cancellation"),
                Err(e) => self.fail(e),
            },
            Action::ConfirmJustification(reason) => match self.machine.confirm_justification(&reason) {
                Ok(()) => self.app.set_info("Pick the new slot and press Enter, Esc to give up"),
                Err(e) => self.fail(e),
            },
        }
    }

    fn fail(&mut self, error: BookingError) {
        tracing::debug!("Booking action failed: {}", error);
        if error.requires_refetch() {
            self.grid.refresh();
            self.mobile.refresh();
        }
        self.app.report_error(&error);
    }

    fn follow_cursor(&mut self) {
        self.grid.set_kind(self.app.grid_kind());
        self.grid.navigate(self.app.selected_date);
        self.mobile.set_kind(self.app.mobile_kind);
        self.mobile.navigate(self.app.selected_date);
    }
}

pub async fn run_tui(config: Config) -> anyhow::Result<()> {
    let policy = config.business_policy()?;
    let viewer = config.viewer()?;
    let fixer_id = config.identity.fixer_id.trim().to_string();
    if fixer_id.is_empty() {
        anyhow::bail!(
            "No fixer configured. Set identity.fixer_id in {} or pass --fixer",
            Config::config_path().display()
        );
    }

    let clock = SlotClock::system(policy.clone());
    let api: Arc<dyn AppointmentApi> = Arc::new(
        AppointmentClient::new(config.backend.base_url.clone(), policy).with_timeout(config.request_timeout()),
    );
    let bridge = SyncBridge::new();
    let (responses_tx, responses_rx) = mpsc::unbounded_channel();
    let context = SurfaceContext {
        api: Arc::clone(&api),
        bridge: bridge.clone(),
        generator: SlotGenerator::new(clock.clone()),
        fixer_id: fixer_id.clone(),
        viewer: viewer.clone(),
        responses: responses_tx,
    };
    let machine = BookingMachine::new(api, bridge, clock.clone(), fixer_id, viewer);

    let grid_scale = GridScale::from_name(&config.ui.default_view).unwrap_or(GridScale::Week);
    let mobile_kind = SurfaceKind::mobile_from_name(&config.ui.mobile_view).unwrap_or(SurfaceKind::MobileDay);
    let app = AppState::new(clock)
        .with_theme(Theme::get_by_name(&config.ui.theme))
        .with_grid_scale(grid_scale)
        .with_mobile_kind(mobile_kind);

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut session = Session::new(app, machine, &context, responses_rx);
    let res = run_app(&mut terminal, &mut session).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(anyhow::Error::from)
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    session: &mut Session,
) -> io::Result<()> {
    loop {
        session.pump();
        terminal.draw(|f| ui(f, session))?;

        if event::poll(Duration::from_millis(100))?
            && let TermEvent::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            session.handle_key(key).await;
        }

        if session.app.should_quit {
            tracing::info!("Leaving the calendar");
            return Ok(());
        }
    }
}
