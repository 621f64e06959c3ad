use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate};
use tokio::sync::mpsc;

use crate::calendar::{ScheduleRecord, ScheduleState, Slot, SlotState, Viewer, YearMonth};
use crate::scheduling::booking::{BookingError, BookingMachine, GuardViolation};
use crate::scheduling::generator::{SlotGenerator, week_start};
use crate::scheduling::reconciler::reconcile;
use crate::sync::api::AppointmentApi;
use crate::sync::bridge::{Subscription, SyncBridge};
use crate::sync::viewport::{ViewportId, ViewportLoader, ViewportResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridScale {
    Month,
    Week,
    Day,
}

impl GridScale {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "month" => Some(GridScale::Month),
            "week" => Some(GridScale::Week),
            "day" => Some(GridScale::Day),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Grid(GridScale),
    MobileDay,
    MobileWeek,
}

impl SurfaceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceKind::Grid(GridScale::Month) => "Month",
            SurfaceKind::Grid(GridScale::Week) => "Week",
            SurfaceKind::Grid(GridScale::Day) => "Day",
            SurfaceKind::MobileDay => "Day list",
            SurfaceKind::MobileWeek => "Week list",
        }
    }

    pub fn mobile_from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "day" => Some(SurfaceKind::MobileDay),
            "week" => Some(SurfaceKind::MobileWeek),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct SurfaceContext {
    pub api: Arc<dyn AppointmentApi>,
    pub bridge: SyncBridge,
    pub generator: SlotGenerator,
    pub fixer_id: String,
    pub viewer: Viewer,
    pub responses: mpsc::UnboundedSender<ViewportResponse>,
}

pub struct CalendarAdapter {
    kind: SurfaceKind,
    anchor: NaiveDate,
    generator: SlotGenerator,
    fixer_id: String,
    viewer: Viewer,
    bridge: SyncBridge,
    loader: ViewportLoader,
    subscription: Option<Subscription>,
    records: Vec<ScheduleRecord>,
    loaded_range: Option<(NaiveDate, NaiveDate)>,
    slots: Vec<Slot>,
    loading: bool,
    error: Option<String>,
}

impl CalendarAdapter {
    pub fn new(id: ViewportId, kind: SurfaceKind, anchor: NaiveDate, context: &SurfaceContext) -> Self {
        Self {
            kind,
            anchor,
            generator: context.generator.clone(),
            fixer_id: context.fixer_id.clone(),
            viewer: context.viewer.clone(),
            bridge: context.bridge.clone(),
            loader: ViewportLoader::new(id, Arc::clone(&context.api), context.responses.clone()),
            subscription: None,
            records: Vec::new(),
            loaded_range: None,
            slots: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn id(&self) -> ViewportId {
        self.loader.viewport()
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn mount(&mut self) {
        if self.subscription.is_none() {
            self.subscription = Some(self.bridge.subscribe());
        }
        self.refresh();
    }

    pub fn unmount(&mut self) {
        self.subscription = None;
        self.loader.abort();
        self.loading = false;
    }

    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        match self.kind {
            SurfaceKind::Grid(GridScale::Month) => {
                let month = YearMonth::containing(self.anchor);
                (
                    month.first_day().unwrap_or(self.anchor),
                    month.last_day().unwrap_or(self.anchor),
                )
            }
            SurfaceKind::Grid(GridScale::Week) | SurfaceKind::MobileWeek => {
                let monday = week_start(self.anchor);
                (monday, monday.checked_add_days(Days::new(6)).unwrap_or(monday))
            }
            SurfaceKind::Grid(GridScale::Day) | SurfaceKind::MobileDay => (self.anchor, self.anchor),
        }
    }

    pub fn navigate(&mut self, anchor: NaiveDate) {
        let before = self.range();
        self.anchor = anchor;
        if self.range() != before {
            self.refresh();
        }
    }

    pub fn set_kind(&mut self, kind: SurfaceKind) {
        if self.kind != kind {
            self.kind = kind;
            self.refresh();
        }
    }

    /// Regenerates the grid immediately and asks the backend for the range.
    /// Records from an earlier load of the same range stay on screen until
    /// the answer arrives. The previous request, if any, is aborted.
    pub fn refresh(&mut self) {
        let (start, end) = self.range();
        if self.loaded_range != Some((start, end)) {
            self.records.clear();
            self.loaded_range = None;
        }
        self.reconcile();
        self.loading = true;
        self.error = None;
        self.loader.request(&self.fixer_id, start, end);
    }

    pub fn handle_response(&mut self, response: ViewportResponse) -> bool {
        if response.viewport != self.id() {
            return false;
        }
        let Some(result) = self.loader.accept(response) else {
            return false;
        };

        self.loading = false;
        match result {
            Ok(records) => {
                tracing::debug!("{} view received {} record(s)", self.kind.name(), records.len());
                self.records = records;
                self.loaded_range = Some(self.range());
                self.reconcile();
            }
            Err(e) => {
                tracing::error!("{} view failed to load schedules: {}", self.kind.name(), e);
                self.error = Some("Could not load the calendar. Press r to retry.".to_string());
            }
        }
        true
    }

    pub fn poll_sync(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        let events = subscription.drain();
        if events.is_empty() {
            return false;
        }
        tracing::debug!("{} view refreshing after {} booking event(s)", self.kind.name(), events.len());
        self.refresh();
        true
    }

    pub fn slot_at(&self, start: DateTime<FixedOffset>) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.start == start)
    }

    pub fn booked_requester_at(&self, start: DateTime<FixedOffset>) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.starting_time == start && r.schedule_state == ScheduleState::Booked)
            .and_then(|r| r.requester_id.as_deref())
    }

    pub async fn activate(
        &self,
        start: DateTime<FixedOffset>,
        machine: &mut BookingMachine,
    ) -> Result<(), BookingError> {
        if self.loading {
            return Err(GuardViolation::StillLoading.into());
        }
        let Some(slot) = self.slot_at(start) else {
            return Err(GuardViolation::Unavailable(SlotState::NotAvailable).into());
        };

        match slot.state {
            SlotState::Available if machine.is_picking_reschedule_slot() => {
                machine.choose_reschedule_slot(slot)
            }
            SlotState::Available => machine.select_slot(slot),
            SlotState::Booked => {
                let requester_id = match &self.viewer {
                    Viewer::Requester { requester_id } => Some(requester_id.as_str()),
                    Viewer::Fixer => self.booked_requester_at(start),
                };
                let Some(requester_id) = requester_id else {
                    tracing::warn!("Booked slot {} has no requester on record", start);
                    return Err(GuardViolation::NotEditable.into());
                };
                machine.open_booked(slot, requester_id).await
            }
            state => Err(GuardViolation::Unavailable(state).into()),
        }
    }

    fn generate(&self) -> Vec<Slot> {
        match self.kind {
            SurfaceKind::Grid(GridScale::Month) => {
                self.generator
                    .generate_month(self.anchor.month(), self.anchor.year(), &self.fixer_id)
            }
            SurfaceKind::Grid(GridScale::Week) | SurfaceKind::MobileWeek => {
                self.generator.generate_week(self.anchor, &self.fixer_id)
            }
            SurfaceKind::Grid(GridScale::Day) | SurfaceKind::MobileDay => {
                self.generator.generate_day(self.anchor, &self.fixer_id)
            }
        }
    }

    fn reconcile(&mut self) {
        self.slots = reconcile(self.generate(), &self.records, &self.viewer);
    }
}
