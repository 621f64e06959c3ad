use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde_json::json;
use thiserror::Error;

use crate::calendar::{Appointment, NewAppointment, Party, Slot, SlotState, Viewer};
use crate::scheduling::clock::SlotClock;
use crate::scheduling::form::{AppointmentForm, AppointmentPatch};
use crate::scheduling::validation::{FormField, ValidationErrors, validate_justification};
use crate::sync::api::{ApiError, AppointmentApi, SlotLookup};
use crate::sync::bridge::{BookingCreated, SyncBridge};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardViolation {
    #[error("This hour has already passed")]
    PastSlot,
    #[error("The fixer does not work on this day")]
    NonBusinessDay,
    #[error("This hour is outside business hours")]
    OutsideBusinessHours,
    #[error("This slot is {0} and cannot be booked")]
    Unavailable(SlotState),
    #[error("Only requesters can book a slot")]
    RequesterOnly,
    #[error("This appointment cannot be edited from here")]
    NotEditable,
    #[error("This appointment is no longer booked")]
    NotBooked,
    #[error("Appointments can only be cancelled more than {hours} hours before they start")]
    CancellationWindow { hours: i64 },
    #[error("Pick a different hour than the original appointment")]
    SameSlot,
    #[error("The calendar is still loading")]
    StillLoading,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Guard(#[from] GuardViolation),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("This slot was just taken. The calendar is being refreshed.")]
    SlotTaken,
    #[error("{0}")]
    Rejected(String),
    #[error("Something went wrong, please try again: {0}")]
    Network(ApiError),
    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
}

impl BookingError {
    pub fn requires_refetch(&self) -> bool {
        matches!(self, BookingError::SlotTaken)
    }
}

impl From<ApiError> for BookingError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Conflict(_) => BookingError::SlotTaken,
            ApiError::Rejected { message, .. } => BookingError::Rejected(message),
            other => BookingError::Network(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RescheduleContext {
    pub original: Appointment,
    pub justification: String,
    pub initiated_by: Party,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingPhase {
    Idle,
    Pending { slot: Slot, form: AppointmentForm },
    Editing {
        original: Appointment,
        form: AppointmentForm,
    },
    AwaitingJustification { appointment: Appointment },
    Rescheduling {
        context: RescheduleContext,
        target: Option<(Slot, AppointmentForm)>,
    },
}

impl BookingPhase {
    pub fn name(&self) -> &'static str {
        match self {
            BookingPhase::Idle => "idle",
            BookingPhase::Pending { .. } => "booking a slot",
            BookingPhase::Editing { .. } => "editing an appointment",
            BookingPhase::AwaitingJustification { .. } => "waiting for a cancellation reason",
            BookingPhase::Rescheduling { .. } => "rescheduling",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Created {
        appointment_id: String,
        starting_time: DateTime<FixedOffset>,
    },
    Updated {
        appointment_id: String,
        changed_fields: Vec<String>,
    },
    Unchanged,
    Rescheduled {
        appointment_id: String,
        starting_time: DateTime<FixedOffset>,
        superseded_id: String,
    },
}

enum Submission {
    Create {
        request: NewAppointment,
    },
    Reschedule {
        request: NewAppointment,
        context: RescheduleContext,
    },
    Update {
        appointment_id: String,
        patch: AppointmentPatch,
    },
    Unchanged,
}

/// Drives one viewer through create, edit, cancel and reschedule. The
/// backend stays the arbiter of conflicts; everything checked here is only
/// what can be known locally.
pub struct BookingMachine {
    api: Arc<dyn AppointmentApi>,
    bridge: SyncBridge,
    clock: SlotClock,
    fixer_id: String,
    viewer: Viewer,
    phase: BookingPhase,
}

impl BookingMachine {
    pub fn new(
        api: Arc<dyn AppointmentApi>,
        bridge: SyncBridge,
        clock: SlotClock,
        fixer_id: impl Into<String>,
        viewer: Viewer,
    ) -> Self {
        Self {
            api,
            bridge,
            clock,
            fixer_id: fixer_id.into(),
            viewer,
            phase: BookingPhase::Idle,
        }
    }

    pub fn phase(&self) -> &BookingPhase {
        &self.phase
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn fixer_id(&self) -> &str {
        &self.fixer_id
    }

    pub fn is_idle(&self) -> bool {
        self.phase == BookingPhase::Idle
    }

    pub fn is_picking_reschedule_slot(&self) -> bool {
        matches!(self.phase, BookingPhase::Rescheduling { target: None, .. })
    }

    pub fn form(&self) -> Option<&AppointmentForm> {
        match &self.phase {
            BookingPhase::Pending { form, .. } | BookingPhase::Editing { form, .. } => Some(form),
            BookingPhase::Rescheduling { target: Some((_, form)), .. } => Some(form),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut AppointmentForm> {
        match &mut self.phase {
            BookingPhase::Pending { form, .. } | BookingPhase::Editing { form, .. } => Some(form),
            BookingPhase::Rescheduling { target: Some((_, form)), .. } => Some(form),
            _ => None,
        }
    }

    pub fn close(&mut self) {
        self.phase = match std::mem::replace(&mut self.phase, BookingPhase::Idle) {
            BookingPhase::Rescheduling { context, target: Some(_) } => {
                BookingPhase::Rescheduling { context, target: None }
            }
            BookingPhase::Idle => BookingPhase::Idle,
            other => {
                tracing::debug!("Booking dialog closed while {}", other.name());
                BookingPhase::Idle
            }
        };
    }

    pub fn select_slot(&mut self, slot: &Slot) -> Result<(), BookingError> {
        self.expect_idle("book a slot")?;
        if self.viewer.requester_id().is_none() {
            return Err(GuardViolation::RequesterOnly.into());
        }
        self.guard_bookable(slot)?;

        tracing::debug!("Opening booking form for {}", slot.start);
        self.phase = BookingPhase::Pending {
            slot: slot.clone(),
            form: AppointmentForm::new(slot.start),
        };
        Ok(())
    }

    pub async fn open_booked(&mut self, slot: &Slot, requester_id: &str) -> Result<(), BookingError> {
        self.expect_idle("open an appointment")?;
        if !slot.is_editable_by(&self.viewer) {
            return Err(GuardViolation::NotEditable.into());
        }

        let lookup = SlotLookup {
            fixer_id: self.fixer_id.clone(),
            requester_id: requester_id.to_string(),
            starting_time: slot.start,
        };
        let appointment = self.api.fetch_appointment(&lookup).await?;
        self.edit_booking(appointment, slot)
    }

    pub fn edit_booking(&mut self, appointment: Appointment, slot: &Slot) -> Result<(), BookingError> {
        self.expect_idle("edit an appointment")?;
        if !slot.is_editable_by(&self.viewer) || !self.may_manage(&appointment) {
            return Err(GuardViolation::NotEditable.into());
        }
        if !appointment.is_booked() {
            return Err(GuardViolation::NotBooked.into());
        }

        let form = AppointmentForm::for_details(appointment.starting_time, &appointment.details);
        self.phase = BookingPhase::Editing { original: appointment, form };
        Ok(())
    }

    pub fn request_cancel(&mut self, appointment: &Appointment) -> Result<(), BookingError> {
        match &self.phase {
            BookingPhase::Idle => {}
            BookingPhase::Editing { original, .. } if original.id == appointment.id => {}
            other => {
                return Err(BookingError::InvalidTransition {
                    action: "cancel an appointment",
                    phase: other.name(),
                });
            }
        }
        if !self.may_manage(appointment) {
            return Err(GuardViolation::NotEditable.into());
        }
        if !appointment.is_booked() {
            return Err(GuardViolation::NotBooked.into());
        }

        let notice = self.clock.policy().cancellation_notice;
        let remaining = appointment.time_until_start(self.clock.now_in_business_tz());
        if remaining < notice {
            tracing::info!(
                "Refusing to cancel appointment {}: starts in {} minute(s)",
                appointment.id,
                remaining.num_minutes()
            );
            return Err(GuardViolation::CancellationWindow { hours: notice.num_hours() }.into());
        }

        self.phase = BookingPhase::AwaitingJustification { appointment: appointment.clone() };
        Ok(())
    }

    pub fn request_cancel_current(&mut self) -> Result<(), BookingError> {
        let BookingPhase::Editing { original, .. } = &self.phase else {
            return Err(BookingError::InvalidTransition {
                action: "cancel an appointment",
                phase: self.phase.name(),
            });
        };
        let original = original.clone();
        self.request_cancel(&original)
    }

    pub fn confirm_justification(&mut self, reason: &str) -> Result<(), BookingError> {
        let BookingPhase::AwaitingJustification { appointment } = &self.phase else {
            return Err(BookingError::InvalidTransition {
                action: "justify a cancellation",
                phase: self.phase.name(),
            });
        };
        let justification = validate_justification(reason)
            .map_err(|message| ValidationErrors::single(FormField::Justification, message))?;

        let context = RescheduleContext {
            original: appointment.clone(),
            justification,
            initiated_by: self.viewer.party(),
        };
        tracing::debug!("Cancellation of {} justified; choosing a new slot", context.original.id);
        self.phase = BookingPhase::Rescheduling { context, target: None };
        Ok(())
    }

    pub fn choose_reschedule_slot(&mut self, slot: &Slot) -> Result<(), BookingError> {
        let BookingPhase::Rescheduling { context, .. } = &self.phase else {
            return Err(BookingError::InvalidTransition {
                action: "pick a new slot",
                phase: self.phase.name(),
            });
        };
        if slot.start == context.original.starting_time {
            return Err(GuardViolation::SameSlot.into());
        }
        self.guard_bookable(slot)?;

        let form = AppointmentForm::for_details(slot.start, &context.original.details);
        let context = context.clone();
        self.phase = BookingPhase::Rescheduling {
            context,
            target: Some((slot.clone(), form)),
        };
        Ok(())
    }

    pub async fn reschedule(&mut self, new_slot: &Slot) -> Result<BookingOutcome, BookingError> {
        self.choose_reschedule_slot(new_slot)?;
        self.submit().await
    }

    /// Sends whatever the open form describes. Validation failures and
    /// network errors leave the form open; a conflict closes it.
    pub async fn submit(&mut self) -> Result<BookingOutcome, BookingError> {
        match self.prepare_submission()? {
            Submission::Unchanged => {
                self.phase = BookingPhase::Idle;
                Ok(BookingOutcome::Unchanged)
            }
            Submission::Create { request } => {
                let created = self.send_create(&request).await?;
                self.announce(&request, &created, json!({ "requester_id": request.requester_id }));
                self.phase = BookingPhase::Idle;
                Ok(BookingOutcome::Created {
                    appointment_id: created,
                    starting_time: request.starting_time,
                })
            }
            Submission::Reschedule { request, context } => {
                let created = self.send_create(&request).await?;
                self.forward_justification(&context).await;
                self.announce(
                    &request,
                    &created,
                    json!({
                        "requester_id": request.requester_id,
                        "rescheduled_from": context.original.id,
                    }),
                );
                self.phase = BookingPhase::Idle;
                Ok(BookingOutcome::Rescheduled {
                    appointment_id: created,
                    starting_time: request.starting_time,
                    superseded_id: context.original.id,
                })
            }
            Submission::Update { appointment_id, patch } => {
                match self.api.update_appointment(&appointment_id, &patch).await {
                    Ok(()) => {
                        tracing::info!(
                            "Updated appointment {} ({} field(s))",
                            appointment_id,
                            patch.len()
                        );
                        self.phase = BookingPhase::Idle;
                        Ok(BookingOutcome::Updated {
                            changed_fields: patch.changed_fields().into_iter().map(String::from).collect(),
                            appointment_id,
                        })
                    }
                    Err(e) => Err(self.fail(e)),
                }
            }
        }
    }

    fn prepare_submission(&mut self) -> Result<Submission, BookingError> {
        let requester_id = self.viewer.requester_id().map(str::to_string);
        let fixer_id = self.fixer_id.clone();

        let submission = match &mut self.phase {
            BookingPhase::Pending { slot, form } => {
                let details = form.validate()?;
                let requester_id = requester_id.ok_or(GuardViolation::RequesterOnly)?;
                Submission::Create {
                    request: NewAppointment::at(&fixer_id, &requester_id, slot.start, details),
                }
            }
            BookingPhase::Rescheduling { context, target: Some((slot, form)) } => {
                let details = form.validate()?;
                Submission::Reschedule {
                    request: NewAppointment::at(
                        &fixer_id,
                        &context.original.requester_id,
                        slot.start,
                        details,
                    ),
                    context: context.clone(),
                }
            }
            BookingPhase::Editing { original, form } => {
                let details = form.validate()?;
                let patch = AppointmentPatch::between(&original.details, &details);
                if patch.is_empty() {
                    Submission::Unchanged
                } else {
                    Submission::Update { appointment_id: original.id.clone(), patch }
                }
            }
            other => {
                return Err(BookingError::InvalidTransition {
                    action: "submit",
                    phase: other.name(),
                });
            }
        };

        // The form may have been open long enough for the hour to pass.
        if let Submission::Create { request } | Submission::Reschedule { request, .. } = &submission
            && self.clock.is_past_hour(request.selected_date(), request.starting_time.hour())
        {
            self.close();
            return Err(GuardViolation::PastSlot.into());
        }
        Ok(submission)
    }

    async fn send_create(&mut self, request: &NewAppointment) -> Result<String, BookingError> {
        match self.api.create_appointment(request).await {
            Ok(created) => {
                tracing::info!("Booked {} for {}", created.id, request.starting_time);
                Ok(created.id)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, error: ApiError) -> BookingError {
        let error = BookingError::from(error);
        match &error {
            BookingError::SlotTaken => {
                tracing::info!("Slot taken by someone else; closing the form");
                self.close();
            }
            other => tracing::error!("Booking request failed: {}", other),
        }
        error
    }

    /// The replacement is already booked, so a failure here is only logged.
    async fn forward_justification(&self, context: &RescheduleContext) {
        let patch = AppointmentPatch::cancellation(&context.justification, context.initiated_by);
        if let Err(e) = self.api.update_appointment(&context.original.id, &patch).await {
            tracing::warn!(
                "Could not record cancellation reason on {}: {}",
                context.original.id,
                e
            );
        }
    }

    fn announce(&self, request: &NewAppointment, appointment_id: &str, mut meta: serde_json::Value) {
        if let Some(map) = meta.as_object_mut() {
            map.insert("fixer_id".to_string(), json!(request.fixer_id));
        }
        self.bridge.publish(BookingCreated::new(
            request.starting_time.with_timezone(&Utc),
            appointment_id,
            meta,
        ));
    }

    fn expect_idle(&self, action: &'static str) -> Result<(), BookingError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(BookingError::InvalidTransition { action, phase: self.phase.name() })
        }
    }

    fn may_manage(&self, appointment: &Appointment) -> bool {
        match &self.viewer {
            Viewer::Fixer => appointment.fixer_id == self.fixer_id,
            Viewer::Requester { requester_id } => appointment.requester_id == *requester_id,
        }
    }

    fn guard_bookable(&self, slot: &Slot) -> Result<(), GuardViolation> {
        if slot.state != SlotState::Available {
            return Err(GuardViolation::Unavailable(slot.state));
        }
        let (date, hour) = (slot.date(), slot.hour());
        if self.clock.is_past_hour(date, hour) {
            return Err(GuardViolation::PastSlot);
        }
        if !self.clock.is_business_day(date) {
            return Err(GuardViolation::NonBusinessDay);
        }
        if !self.clock.is_within_business_hours(hour) {
            return Err(GuardViolation::OutsideBusinessHours);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{AppointmentDetails, Modality, ScheduleState, YearMonth};
    use crate::scheduling::clock::BusinessPolicy;
    use crate::scheduling::form::ModalityInput;
    use crate::scheduling::generator::SlotGenerator;
    use crate::scheduling::reconciler::reconcile;
    use crate::sync::api::MockAppointmentApi;
    use crate::sync::in_memory::{Failure, InMemoryAppointments};
    use chrono::{NaiveDate, TimeZone};

    const FIXER: &str = "fixer-1";

    // 2025-01-13 is a Monday.
    fn local(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        BusinessPolicy::bolivia()
            .business_offset
            .with_ymd_and_hms(2025, 1, day, hour, minute, 0)
            .unwrap()
    }

    fn clock_at(day: u32, hour: u32, minute: u32) -> SlotClock {
        SlotClock::fixed(BusinessPolicy::bolivia(), local(day, hour, minute).with_timezone(&Utc))
    }

    fn machine(
        api: Arc<dyn AppointmentApi>,
        bridge: &SyncBridge,
        viewer: Viewer,
        now: SlotClock,
    ) -> BookingMachine {
        BookingMachine::new(api, bridge.clone(), now, FIXER, viewer)
    }

    fn slot(day: u32, hour: u32, state: SlotState) -> Slot {
        Slot::new(FIXER, local(day, hour, 0), state)
    }

    fn fill(form: &mut AppointmentForm) {
        form.client = "Maria Lopez".to_string();
        form.contact = "71234567".to_string();
        form.description = "Leaking kitchen pipe".to_string();
        form.modality = ModalityInput::Virtual {
            meeting_link: "https://meet.google.com/abc-defg-hij".to_string(),
        };
    }

    fn booked(id: &str, requester_id: &str, day: u32, hour: u32) -> Appointment {
        Appointment {
            id: id.to_string(),
            fixer_id: FIXER.to_string(),
            requester_id: requester_id.to_string(),
            starting_time: local(day, hour, 0),
            finishing_time: local(day, hour + 1, 0),
            details: AppointmentDetails {
                client: "Maria Lopez".to_string(),
                contact: "71234567".to_string(),
                description: "Leaking kitchen pipe".to_string(),
                modality: Modality::Virtual {
                    meeting_link: "https://meet.google.com/abc-defg-hij".to_string(),
                },
            },
            schedule_state: ScheduleState::Booked,
            cancelled_by: None,
        }
    }

    async fn day_as(store: &InMemoryAppointments, viewer: &Viewer, day: u32, now: SlotClock) -> Vec<Slot> {
        let records = store
            .fetch_schedules(FIXER, YearMonth::new(2025, 1).unwrap())
            .await
            .unwrap();
        let generated = SlotGenerator::new(now).generate_day(NaiveDate::from_ymd_opt(2025, 1, day).unwrap(), FIXER);
        reconcile(generated, &records, viewer)
    }

    fn state_at(slots: &[Slot], hour: u32) -> SlotState {
        slots.iter().find(|s| s.hour() == hour).unwrap().state
    }

    #[tokio::test]
    async fn requester_books_an_available_slot() {
        let store = Arc::new(InMemoryAppointments::new());
        let bridge = SyncBridge::new();
        let mut views = bridge.subscribe();
        let mut machine = machine(store.clone(), &bridge, Viewer::requester("req-1"), clock_at(13, 8, 0));

        machine.select_slot(&slot(14, 10, SlotState::Available)).unwrap();
        fill(machine.form_mut().unwrap());
        let outcome = machine.submit().await.unwrap();

        assert_eq!(
            outcome,
            BookingOutcome::Created { appointment_id: "apt-1".to_string(), starting_time: local(14, 10, 0) }
        );
        assert!(machine.is_idle());

        let events = views.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].datetime, Utc.with_ymd_and_hms(2025, 1, 14, 14, 0, 0).unwrap());
        assert_eq!(events[0].meta["requester_id"], "req-1");

        let own = day_as(&store, &Viewer::requester("req-1"), 14, clock_at(13, 8, 0)).await;
        let other = day_as(&store, &Viewer::requester("req-2"), 14, clock_at(13, 8, 0)).await;
        assert_eq!(state_at(&own, 10), SlotState::Booked);
        assert_eq!(state_at(&other, 10), SlotState::NotAvailable);
    }

    #[tokio::test]
    async fn created_appointment_reads_back_unchanged() {
        let store = Arc::new(InMemoryAppointments::new());
        let bridge = SyncBridge::new();
        let mut machine = machine(store.clone(), &bridge, Viewer::requester("req-1"), clock_at(13, 8, 0));

        machine.select_slot(&slot(14, 10, SlotState::Available)).unwrap();
        fill(machine.form_mut().unwrap());
        let expected = machine.form_mut().unwrap().validate().unwrap();
        machine.submit().await.unwrap();

        let lookup = SlotLookup {
            fixer_id: FIXER.to_string(),
            requester_id: "req-1".to_string(),
            starting_time: local(14, 10, 0),
        };
        assert_eq!(store.fetch_appointment(&lookup).await.unwrap().details, expected);
    }

    #[tokio::test]
    async fn elapsed_hours_cannot_be_booked() {
        let store = Arc::new(InMemoryAppointments::new());
        let bridge = SyncBridge::new();
        let now = clock_at(14, 10, 30);
        let mut machine = machine(store.clone(), &bridge, Viewer::requester("req-1"), now.clone());

        let day = day_as(&store, &Viewer::requester("req-1"), 14, now).await;
        let nine = day.iter().find(|s| s.hour() == 9).unwrap();
        assert_eq!(nine.state, SlotState::NotAvailable);
        assert!(matches!(
            machine.select_slot(nine),
            Err(BookingError::Guard(GuardViolation::Unavailable(SlotState::NotAvailable)))
        ));

        // A grid rendered before the hour rolled over still shows it open.
        for hour in [9, 10] {
            assert!(matches!(
                machine.select_slot(&slot(14, hour, SlotState::Available)),
                Err(BookingError::Guard(GuardViolation::PastSlot))
            ));
        }
        assert!(machine.is_idle());
        assert_eq!(store.creates(), 0);
    }

    #[tokio::test]
    async fn fixers_do_not_book_directly() {
        let store = Arc::new(InMemoryAppointments::new());
        let mut machine = machine(store, &SyncBridge::new(), Viewer::Fixer, clock_at(13, 8, 0));
        assert!(matches!(
            machine.select_slot(&slot(14, 10, SlotState::Available)),
            Err(BookingError::Guard(GuardViolation::RequesterOnly))
        ));
    }

    #[tokio::test]
    async fn invalid_form_stays_open_and_sends_nothing() {
        let store = Arc::new(InMemoryAppointments::new());
        let mut machine = machine(store.clone(), &SyncBridge::new(), Viewer::requester("req-1"), clock_at(13, 8, 0));

        machine.select_slot(&slot(14, 10, SlotState::Available)).unwrap();
        machine.form_mut().unwrap().client = "Maria Lopez".to_string();
        let error = machine.submit().await.unwrap_err();

        assert!(matches!(error, BookingError::Validation(_)));
        assert!(matches!(machine.phase(), BookingPhase::Pending { .. }));
        assert!(machine.form().unwrap().errors.for_field(FormField::Contact).is_some());
        assert_eq!(store.creates(), 0);
    }

    #[tokio::test]
    async fn conflict_closes_the_form_and_asks_for_refetch() {
        let store = Arc::new(InMemoryAppointments::new());
        store.insert(booked("apt-9", "req-2", 14, 10));
        let bridge = SyncBridge::new();
        let mut views = bridge.subscribe();
        let mut machine = machine(store.clone(), &bridge, Viewer::requester("req-1"), clock_at(13, 8, 0));

        // Stale grid: the slot still looks free locally.
        machine.select_slot(&slot(14, 10, SlotState::Available)).unwrap();
        fill(machine.form_mut().unwrap());
        let error = machine.submit().await.unwrap_err();

        assert!(matches!(error, BookingError::SlotTaken));
        assert!(error.requires_refetch());
        assert_eq!(error.to_string(), "This slot was just taken. The calendar is being refreshed.");
        assert!(machine.is_idle());
        assert!(views.drain().is_empty());
    }

    #[tokio::test]
    async fn network_failure_keeps_the_form_for_retry() {
        let mut api = MockAppointmentApi::new();
        api.expect_create_appointment()
            .times(1)
            .returning(|_| Err(ApiError::Timeout));
        let mut machine = machine(Arc::new(api), &SyncBridge::new(), Viewer::requester("req-1"), clock_at(13, 8, 0));

        machine.select_slot(&slot(14, 10, SlotState::Available)).unwrap();
        fill(machine.form_mut().unwrap());
        let error = machine.submit().await.unwrap_err();

        assert!(matches!(error, BookingError::Network(ApiError::Timeout)));
        assert!(!error.requires_refetch());
        assert_eq!(machine.form().unwrap().client, "Maria Lopez");
    }

    #[tokio::test]
    async fn backend_rejection_message_is_shown_verbatim() {
        let store = Arc::new(InMemoryAppointments::new());
        store.fail_next_create(Failure::Rejected("El número de contacto no es válido".to_string()));
        let mut machine = machine(store, &SyncBridge::new(), Viewer::requester("req-1"), clock_at(13, 8, 0));

        machine.select_slot(&slot(14, 10, SlotState::Available)).unwrap();
        fill(machine.form_mut().unwrap());
        let error = machine.submit().await.unwrap_err();

        assert_eq!(error.to_string(), "El número de contacto no es válido");
        assert!(matches!(machine.phase(), BookingPhase::Pending { .. }));
    }

    #[tokio::test]
    async fn one_dialog_at_a_time() {
        let store = Arc::new(InMemoryAppointments::new());
        let mut machine = machine(store, &SyncBridge::new(), Viewer::requester("req-1"), clock_at(13, 8, 0));

        machine.select_slot(&slot(14, 10, SlotState::Available)).unwrap();
        assert!(matches!(
            machine.select_slot(&slot(14, 11, SlotState::Available)),
            Err(BookingError::InvalidTransition { .. })
        ));
        machine.close();
        assert!(machine.select_slot(&slot(14, 11, SlotState::Available)).is_ok());
    }

    #[tokio::test]
    async fn cancellation_needs_three_hours_notice() {
        let store: Arc<dyn AppointmentApi> = Arc::new(InMemoryAppointments::new());
        let appointment = booked("apt-1", "req-1", 14, 10);

        let mut late = machine(store.clone(), &SyncBridge::new(), Viewer::Fixer, clock_at(14, 7, 1));
        assert_eq!(
            late.request_cancel(&appointment).unwrap_err().to_string(),
            "Appointments can only be cancelled more than 3 hours before they start"
        );
        assert!(late.is_idle());

        let mut early = machine(store, &SyncBridge::new(), Viewer::Fixer, clock_at(14, 6, 59));
        early.request_cancel(&appointment).unwrap();
        assert!(matches!(early.phase(), BookingPhase::AwaitingJustification { .. }));
    }

    #[tokio::test]
    async fn blank_justification_is_refused() {
        let store = Arc::new(InMemoryAppointments::new());
        let mut machine = machine(store, &SyncBridge::new(), Viewer::Fixer, clock_at(13, 8, 0));

        machine.request_cancel(&booked("apt-1", "req-1", 15, 14)).unwrap();
        let error = machine.confirm_justification("   ").unwrap_err();

        match error {
            BookingError::Validation(errors) => assert!(errors.for_field(FormField::Justification).is_some()),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(machine.phase(), BookingPhase::AwaitingJustification { .. }));
    }

    #[tokio::test]
    async fn fixer_cancels_and_reschedules() {
        let store = Arc::new(InMemoryAppointments::new());
        store.insert(booked("apt-orig", "req-1", 15, 14));
        let bridge = SyncBridge::new();
        let mut views = bridge.subscribe();
        let now = clock_at(13, 9, 0);
        let mut machine = machine(store.clone(), &bridge, Viewer::Fixer, now.clone());

        machine.request_cancel(&booked("apt-orig", "req-1", 15, 14)).unwrap();
        machine.confirm_justification("client unavailable").unwrap();
        assert!(machine.is_picking_reschedule_slot());
        let outcome = machine.reschedule(&slot(16, 10, SlotState::Available)).await.unwrap();

        assert_eq!(
            outcome,
            BookingOutcome::Rescheduled {
                appointment_id: "apt-1".to_string(),
                starting_time: local(16, 10, 0),
                superseded_id: "apt-orig".to_string(),
            }
        );
        let events = views.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].meta["rescheduled_from"], "apt-orig");

        let original = store.appointment("apt-orig").unwrap();
        assert_eq!(original.schedule_state, ScheduleState::Cancelled);
        assert_eq!(original.cancelled_by, Some(Party::Fixer));
        assert_eq!(store.reason_for("apt-orig").as_deref(), Some("client unavailable"));

        let replacement = store.appointment("apt-1").unwrap();
        assert_eq!(replacement.requester_id, "req-1");
        assert_eq!(replacement.details, original.details);

        let requester_view = day_as(&store, &Viewer::requester("req-1"), 15, now.clone()).await;
        let fixer_view = day_as(&store, &Viewer::Fixer, 15, now).await;
        assert_eq!(state_at(&requester_view, 14), SlotState::CancelledByFixer);
        assert_eq!(state_at(&fixer_view, 14), SlotState::Available);
    }

    #[tokio::test]
    async fn reschedule_to_the_same_hour_is_refused() {
        let store = Arc::new(InMemoryAppointments::new());
        let mut machine = machine(store, &SyncBridge::new(), Viewer::Fixer, clock_at(13, 9, 0));

        machine.request_cancel(&booked("apt-1", "req-1", 15, 14)).unwrap();
        machine.confirm_justification("client unavailable").unwrap();

        assert!(matches!(
            machine.choose_reschedule_slot(&slot(15, 14, SlotState::Available)),
            Err(BookingError::Guard(GuardViolation::SameSlot))
        ));
        assert!(machine.is_picking_reschedule_slot());
    }

    #[tokio::test]
    async fn reschedule_onto_a_slot_taken_meanwhile_keeps_the_original() {
        let store = Arc::new(InMemoryAppointments::new());
        store.insert(booked("apt-orig", "req-1", 15, 14));
        store.fail_next_create(Failure::Conflict);
        let bridge = SyncBridge::new();
        let mut views = bridge.subscribe();
        let mut machine = machine(store.clone(), &bridge, Viewer::Fixer, clock_at(13, 9, 0));

        machine.request_cancel(&booked("apt-orig", "req-1", 15, 14)).unwrap();
        machine.confirm_justification("client unavailable").unwrap();
        let error = machine.reschedule(&slot(16, 10, SlotState::Available)).await.unwrap_err();

        assert!(matches!(error, BookingError::SlotTaken));
        assert!(error.requires_refetch());
        let ids: Vec<String> = store.appointments().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["apt-orig".to_string()]);
        assert!(store.updates().is_empty());
        assert!(store.reason_for("apt-orig").is_none());
        assert!(views.drain().is_empty());
    }

    #[tokio::test]
    async fn failed_reason_forwarding_does_not_undo_the_reschedule() {
        let store = Arc::new(InMemoryAppointments::new());
        store.insert(booked("apt-orig", "req-1", 15, 14));
        store.fail_next_update(Failure::Timeout);
        let mut machine = machine(store.clone(), &SyncBridge::new(), Viewer::Fixer, clock_at(13, 9, 0));

        machine.request_cancel(&booked("apt-orig", "req-1", 15, 14)).unwrap();
        machine.confirm_justification("client unavailable").unwrap();
        let outcome = machine.reschedule(&slot(16, 10, SlotState::Available)).await;

        assert!(matches!(outcome, Ok(BookingOutcome::Rescheduled { .. })));
        assert_eq!(store.updates().len(), 1);
    }

    #[tokio::test]
    async fn closing_the_replacement_form_goes_back_to_picking() {
        let store = Arc::new(InMemoryAppointments::new());
        let mut machine = machine(store, &SyncBridge::new(), Viewer::Fixer, clock_at(13, 9, 0));

        machine.request_cancel(&booked("apt-1", "req-1", 15, 14)).unwrap();
        machine.confirm_justification("client unavailable").unwrap();
        machine.choose_reschedule_slot(&slot(16, 10, SlotState::Available)).unwrap();
        assert_eq!(machine.form().unwrap().client, "Maria Lopez");

        machine.close();
        assert!(machine.is_picking_reschedule_slot());
        machine.close();
        assert!(machine.is_idle());
    }

    #[tokio::test]
    async fn edit_sends_only_changed_fields() {
        let store = Arc::new(InMemoryAppointments::new());
        store.insert(booked("apt-1", "req-1", 14, 10));
        let bridge = SyncBridge::new();
        let mut views = bridge.subscribe();
        let mut machine = machine(store.clone(), &bridge, Viewer::requester("req-1"), clock_at(13, 8, 0));

        machine.open_booked(&slot(14, 10, SlotState::Booked), "req-1").await.unwrap();
        machine.form_mut().unwrap().description = "Leaking bathroom pipe".to_string();
        let outcome = machine.submit().await.unwrap();

        assert_eq!(
            outcome,
            BookingOutcome::Updated {
                appointment_id: "apt-1".to_string(),
                changed_fields: vec!["appointment_description".to_string()],
            }
        );
        assert_eq!(store.appointment("apt-1").unwrap().details.description, "Leaking bathroom pipe");
        assert!(views.drain().is_empty());
    }

    #[tokio::test]
    async fn unchanged_edit_makes_no_request() {
        let store = Arc::new(InMemoryAppointments::new());
        store.insert(booked("apt-1", "req-1", 14, 10));
        let mut machine = machine(store.clone(), &SyncBridge::new(), Viewer::Fixer, clock_at(13, 8, 0));

        machine.open_booked(&slot(14, 10, SlotState::Booked), "req-1").await.unwrap();
        assert_eq!(machine.submit().await.unwrap(), BookingOutcome::Unchanged);
        assert!(store.updates().is_empty());
        assert!(machine.is_idle());
    }

    #[tokio::test]
    async fn requesters_only_manage_their_own_appointments() {
        let store = Arc::new(InMemoryAppointments::new());
        let mut machine = machine(store, &SyncBridge::new(), Viewer::requester("req-1"), clock_at(13, 8, 0));
        let someone_else = booked("apt-2", "req-2", 15, 10);

        assert!(matches!(
            machine.edit_booking(someone_else.clone(), &slot(15, 10, SlotState::Booked)),
            Err(BookingError::Guard(GuardViolation::NotEditable))
        ));
        assert!(matches!(
            machine.request_cancel(&someone_else),
            Err(BookingError::Guard(GuardViolation::NotEditable))
        ));
    }

    #[tokio::test]
    async fn cancel_from_the_edit_form() {
        let store = Arc::new(InMemoryAppointments::new());
        store.insert(booked("apt-1", "req-1", 15, 10));
        let mut machine = machine(store, &SyncBridge::new(), Viewer::requester("req-1"), clock_at(13, 8, 0));

        machine.open_booked(&slot(15, 10, SlotState::Booked), "req-1").await.unwrap();
        machine.request_cancel_current().unwrap();
        machine.confirm_justification("travelling").unwrap();

        match machine.phase() {
            BookingPhase::Rescheduling { context, .. } => {
                assert_eq!(context.initiated_by, Party::Requester);
                assert_eq!(context.justification, "travelling");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
