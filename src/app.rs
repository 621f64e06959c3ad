use chrono::{DateTime, Days, FixedOffset, Months, NaiveDate, Timelike};

use crate::scheduling::booking::{
    BookingError, BookingMachine, BookingOutcome, BookingPhase, GuardViolation,
};
use crate::scheduling::clock::SlotClock;
use crate::ui::adapter::{GridScale, SurfaceKind};
use crate::ui::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Form,
    Justification,
    Notice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Grid,
    Mobile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
}

pub struct AppState {
    pub mode: Mode,
    pub focus: Pane,
    pub grid_scale: GridScale,
    pub mobile_kind: SurfaceKind,
    pub selected_date: NaiveDate,
    pub selected_hour: u32,
    pub justification: String,
    pub notice: Option<String>,
    pub status: Option<StatusMessage>,
    pub picking_reschedule: bool,
    pub theme: Theme,
    pub should_quit: bool,
    clock: SlotClock,
}

impl AppState {
    pub fn new(clock: SlotClock) -> Self {
        let now = clock.now_in_business_tz();
        let hours = clock.policy().business_hours();
        let selected_hour = hours
            .iter()
            .copied()
            .find(|hour| *hour > now.hour())
            .or_else(|| hours.first().copied())
            .unwrap_or(0);

        Self {
            mode: Mode::Normal,
            focus: Pane::Grid,
            grid_scale: GridScale::Week,
            mobile_kind: SurfaceKind::MobileDay,
            selected_date: clock.today(),
            selected_hour,
            justification: String::new(),
            notice: None,
            status: None,
            picking_reschedule: false,
            theme: Theme::default(),
            should_quit: false,
            clock,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_grid_scale(mut self, scale: GridScale) -> Self {
        self.grid_scale = scale;
        self
    }

    pub fn with_mobile_kind(mut self, kind: SurfaceKind) -> Self {
        if matches!(kind, SurfaceKind::MobileDay | SurfaceKind::MobileWeek) {
            self.mobile_kind = kind;
        }
        self
    }

    pub fn with_selected_date(mut self, date: NaiveDate) -> Self {
        self.selected_date = date;
        self
    }

    pub fn clock(&self) -> &SlotClock {
        &self.clock
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn business_hours(&self) -> Vec<u32> {
        self.clock.policy().business_hours()
    }

    pub fn grid_kind(&self) -> SurfaceKind {
        SurfaceKind::Grid(self.grid_scale)
    }

    pub fn cursor(&self) -> Option<DateTime<FixedOffset>> {
        self.clock.slot_start(self.selected_date, self.selected_hour)
    }

    pub fn move_days(&mut self, days: i64) {
        let moved = if days >= 0 {
            self.selected_date.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.selected_date.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        if let Some(date) = moved {
            self.selected_date = date;
        }
    }

    pub fn move_months(&mut self, months: i32) {
        let moved = if months >= 0 {
            self.selected_date.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            self.selected_date.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        if let Some(date) = moved {
            self.selected_date = date;
        }
    }

    pub fn move_hours(&mut self, step: i32) {
        let only_business = (self.focus == Pane::Grid && self.grid_scale != GridScale::Day)
            || (self.focus == Pane::Mobile && self.mobile_kind == SurfaceKind::MobileWeek);
        let hours: Vec<u32> = if only_business { self.business_hours() } else { (0..24).collect() };
        let Some(last) = hours.len().checked_sub(1) else {
            return;
        };

        let index = hours.iter().position(|h| *h == self.selected_hour);
        match (index, step >= 0) {
            (Some(i), true) if i == last => {
                self.move_days(1);
                self.selected_hour = hours[0];
            }
            (Some(i), true) => self.selected_hour = hours[i + 1],
            (Some(0), false) => {
                self.move_days(-1);
                self.selected_hour = hours[last];
            }
            (Some(i), false) => self.selected_hour = hours[i - 1],
            (None, _) => {
                self.selected_hour = hours
                    .iter()
                    .copied()
                    .find(|h| *h >= self.selected_hour)
                    .unwrap_or(hours[0]);
            }
        }
    }

    pub fn jump_to_today(&mut self) {
        self.selected_date = self.clock.today();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Pane::Grid => Pane::Mobile,
            Pane::Mobile => Pane::Grid,
        };
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage { text: text.into(), level: StatusLevel::Info });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage { text: text.into(), level: StatusLevel::Error });
    }

    pub fn set_success(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage { text: text.into(), level: StatusLevel::Success });
    }

    pub fn show_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(text.into());
        self.mode = Mode::Notice;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
        self.mode = Mode::Normal;
    }

    pub fn sync_with(&mut self, machine: &BookingMachine) {
        let mode = match machine.phase() {
            BookingPhase::Idle => Mode::Normal,
            BookingPhase::Pending { .. } | BookingPhase::Editing { .. } => Mode::Form,
            BookingPhase::AwaitingJustification { .. } => Mode::Justification,
            BookingPhase::Rescheduling { target: Some(_), .. } => Mode::Form,
            BookingPhase::Rescheduling { target: None, .. } => Mode::Normal,
        };
        if mode != Mode::Justification {
            self.justification.clear();
        }
        self.picking_reschedule = machine.is_picking_reschedule_slot();
        self.mode = if self.notice.is_some() { Mode::Notice } else { mode };
    }

    pub fn report_outcome(&mut self, outcome: &BookingOutcome) {
        match outcome {
            BookingOutcome::Created { starting_time, .. } => {
                self.set_success(format!("Booked {}", starting_time.format("%a %d %b %H:%M")));
            }
            BookingOutcome::Updated { changed_fields, .. } => {
                self.set_success(format!("Saved changes to {}", changed_fields.join(", ")));
            }
            BookingOutcome::Unchanged => self.set_info("Nothing to save"),
            BookingOutcome::Rescheduled { starting_time, .. } => {
                self.set_success(format!(
                    "Rescheduled to {}",
                    starting_time.format("%a %d %b %H:%M")
                ));
            }
        }
    }

    pub fn report_error(&mut self, error: &BookingError) {
        match error {
            BookingError::Guard(GuardViolation::CancellationWindow { .. }) | BookingError::SlotTaken => {
                self.show_notice(error.to_string());
            }
            BookingError::Validation(errors) => {
                let first = errors.iter().next().map(|e| e.to_string()).unwrap_or_default();
                self.set_error(format!("Please fix the form: {}", first));
            }
            other => self.set_error(other.to_string()),
        }
    }
}
