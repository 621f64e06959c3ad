use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::slot::Party;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleState {
    Booked,
    Cancelled,
}

impl ScheduleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleState::Booked => "booked",
            ScheduleState::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "booked" => Some(ScheduleState::Booked),
            "cancelled" | "canceled" => Some(ScheduleState::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub address: String,
}

/// Exactly one of a meeting link or a physical location, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "lowercase")]
pub enum Modality {
    Virtual { meeting_link: String },
    Presential { location: Location },
}

impl Modality {
    pub fn kind(&self) -> &'static str {
        match self {
            Modality::Virtual { .. } => "virtual",
            Modality::Presential { .. } => "presential",
        }
    }

    pub fn meeting_link(&self) -> Option<&str> {
        match self {
            Modality::Virtual { meeting_link } => Some(meeting_link.as_str()),
            Modality::Presential { .. } => None,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Modality::Virtual { .. } => None,
            Modality::Presential { location } => Some(location),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub client: String,
    pub contact: String,
    pub description: String,
    pub modality: Modality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub fixer_id: String,
    pub requester_id: String,
    pub starting_time: DateTime<FixedOffset>,
    pub finishing_time: DateTime<FixedOffset>,
    pub details: AppointmentDetails,
    pub schedule_state: ScheduleState,
    pub cancelled_by: Option<Party>,
}

impl Appointment {
    pub fn date(&self) -> NaiveDate {
        self.starting_time.date_naive()
    }

    pub fn is_booked(&self) -> bool {
        self.schedule_state == ScheduleState::Booked
    }

    pub fn time_until_start(&self, now: DateTime<FixedOffset>) -> Duration {
        self.starting_time - now
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub fixer_id: String,
    pub requester_id: String,
    pub starting_time: DateTime<FixedOffset>,
    pub finishing_time: DateTime<FixedOffset>,
    pub details: AppointmentDetails,
}

impl NewAppointment {
    pub fn at(
        fixer_id: &str,
        requester_id: &str,
        starting_time: DateTime<FixedOffset>,
        details: AppointmentDetails,
    ) -> Self {
        Self {
            fixer_id: fixer_id.to_string(),
            requester_id: requester_id.to_string(),
            starting_time,
            finishing_time: starting_time + Duration::hours(1),
            details,
        }
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.starting_time.date_naive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedAppointment {
    pub id: String,
}
