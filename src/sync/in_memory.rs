use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::calendar::{
    Appointment, CreatedAppointment, Location, Modality, NewAppointment, Party, ScheduleRecord,
    ScheduleState, YearMonth,
};
use crate::scheduling::form::AppointmentPatch;
use crate::sync::api::{ApiError, AppointmentApi, SlotLookup};

#[derive(Debug, Clone)]
pub(crate) enum Failure {
    Conflict,
    Rejected(String),
    Timeout,
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Failure::Conflict => ApiError::Conflict("slot taken".to_string()),
            Failure::Rejected(message) => ApiError::Rejected { status: 400, message },
            Failure::Timeout => ApiError::Timeout,
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    appointments: Vec<Appointment>,
    reasons: Vec<(String, String)>,
    next_id: u64,
    fail_next_create: Option<Failure>,
    fail_next_update: Option<Failure>,
    hanging_fetches: usize,
    creates: usize,
    updates: Vec<(String, AppointmentPatch)>,
    schedule_fetches: usize,
}

#[derive(Debug, Default)]
pub(crate) struct InMemoryAppointments {
    store: Mutex<Store>,
}

impl InMemoryAppointments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, appointment: Appointment) {
        self.store.lock().unwrap().appointments.push(appointment);
    }

    pub fn fail_next_create(&self, failure: Failure) {
        self.store.lock().unwrap().fail_next_create = Some(failure);
    }

    pub fn fail_next_update(&self, failure: Failure) {
        self.store.lock().unwrap().fail_next_update = Some(failure);
    }

    pub fn hang_next_fetches(&self, count: usize) {
        self.store.lock().unwrap().hanging_fetches = count;
    }

    pub fn appointment(&self, id: &str) -> Option<Appointment> {
        self.store
            .lock()
            .unwrap()
            .appointments
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.store.lock().unwrap().appointments.clone()
    }

    pub fn reason_for(&self, id: &str) -> Option<String> {
        self.store
            .lock()
            .unwrap()
            .reasons
            .iter()
            .find(|(appointment_id, _)| appointment_id == id)
            .map(|(_, reason)| reason.clone())
    }

    pub fn creates(&self) -> usize {
        self.store.lock().unwrap().creates
    }

    pub fn updates(&self) -> Vec<(String, AppointmentPatch)> {
        self.store.lock().unwrap().updates.clone()
    }

    pub fn schedule_fetches(&self) -> usize {
        self.store.lock().unwrap().schedule_fetches
    }
}

fn text(patch: &AppointmentPatch, field: &str) -> Option<String> {
    patch.get(field).and_then(Value::as_str).map(str::to_string)
}

fn apply(appointment: &mut Appointment, patch: &AppointmentPatch) {
    let details = &mut appointment.details;
    if let Some(client) = text(patch, "current_requester_name") {
        details.client = client;
    }
    if let Some(contact) = text(patch, "current_requester_phone") {
        details.contact = contact;
    }
    if let Some(description) = text(patch, "appointment_description") {
        details.description = description;
    }

    let kind = text(patch, "appointment_type")
        .unwrap_or_else(|| details.modality.kind().to_string());
    if kind == "virtual" {
        if let Some(meeting_link) = text(patch, "link_id") {
            details.modality = Modality::Virtual { meeting_link };
        }
    } else {
        let mut location = details.modality.location().cloned().unwrap_or(Location {
            lat: 0.0,
            lon: 0.0,
            address: String::new(),
        });
        if let Some(address) = text(patch, "display_name_location") {
            location.address = address;
        }
        if let Some(lat) = patch.get("lat").and_then(Value::as_f64) {
            location.lat = lat;
        }
        if let Some(lon) = patch.get("lon").and_then(Value::as_f64) {
            location.lon = lon;
        }
        details.modality = Modality::Presential { location };
    }

    if patch.get("cancellation_reason").is_some() {
        appointment.schedule_state = ScheduleState::Cancelled;
        appointment.cancelled_by = match text(patch, "cancelled_by").as_deref() {
            Some("fixer") => Some(Party::Fixer),
            Some("requester") => Some(Party::Requester),
            _ => None,
        };
    }
}

#[async_trait]
impl AppointmentApi for InMemoryAppointments {
    async fn fetch_schedules(
        &self,
        fixer_id: &str,
        month: YearMonth,
    ) -> Result<Vec<ScheduleRecord>, ApiError> {
        let records = {
            let mut store = self.store.lock().unwrap();
            store.schedule_fetches += 1;
            if store.hanging_fetches > 0 {
                store.hanging_fetches -= 1;
                None
            } else {
                Some(
                    store
                        .appointments
                        .iter()
                        .filter(|a| a.fixer_id == fixer_id)
                        .filter(|a| YearMonth::containing(a.starting_time.date_naive()) == month)
                        .map(|a| ScheduleRecord {
                            starting_time: a.starting_time,
                            finishing_time: a.finishing_time,
                            schedule_state: a.schedule_state,
                            requester_id: Some(a.requester_id.clone()),
                            cancelled_by: a.cancelled_by,
                        })
                        .collect(),
                )
            }
        };
        match records {
            Some(records) => Ok(records),
            None => std::future::pending().await,
        }
    }

    async fn fetch_appointment(&self, lookup: &SlotLookup) -> Result<Appointment, ApiError> {
        self.store
            .lock()
            .unwrap()
            .appointments
            .iter()
            .find(|a| {
                a.fixer_id == lookup.fixer_id
                    && a.requester_id == lookup.requester_id
                    && a.starting_time == lookup.starting_time
                    && a.is_booked()
            })
            .cloned()
            .ok_or_else(|| ApiError::NotFound("appointment for slot".to_string()))
    }

    async fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<CreatedAppointment, ApiError> {
        let mut store = self.store.lock().unwrap();
        store.creates += 1;
        if let Some(failure) = store.fail_next_create.take() {
            return Err(failure.into_error());
        }
        let taken = store.appointments.iter().any(|a| {
            a.fixer_id == appointment.fixer_id
                && a.starting_time == appointment.starting_time
                && a.is_booked()
        });
        if taken {
            return Err(ApiError::Conflict("slot taken".to_string()));
        }

        store.next_id += 1;
        let id = format!("apt-{}", store.next_id);
        store.appointments.push(Appointment {
            id: id.clone(),
            fixer_id: appointment.fixer_id.clone(),
            requester_id: appointment.requester_id.clone(),
            starting_time: appointment.starting_time,
            finishing_time: appointment.finishing_time,
            details: appointment.details.clone(),
            schedule_state: ScheduleState::Booked,
            cancelled_by: None,
        });
        Ok(CreatedAppointment { id })
    }

    async fn update_appointment(
        &self,
        appointment_id: &str,
        patch: &AppointmentPatch,
    ) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        store.updates.push((appointment_id.to_string(), patch.clone()));
        if let Some(failure) = store.fail_next_update.take() {
            return Err(failure.into_error());
        }
        if let Some(reason) = text(patch, "cancellation_reason") {
            store.reasons.push((appointment_id.to_string(), reason));
        }
        let appointment = store
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
            .ok_or_else(|| ApiError::NotFound(appointment_id.to_string()))?;
        apply(appointment, patch);
        Ok(())
    }
}
