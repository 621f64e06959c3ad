use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Available,
    Booked,
    CancelledByFixer,
    CancelledByRequester,
    NotAvailable,
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotState::Available => "available",
            SlotState::Booked => "booked",
            SlotState::CancelledByFixer => "cancelled_by_fixer",
            SlotState::CancelledByRequester => "cancelled_by_requester",
            SlotState::NotAvailable => "not_available",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SlotState::CancelledByFixer | SlotState::CancelledByRequester)
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Fixer,
    Requester,
}

impl Party {
    pub fn as_str(&self) -> &'static str {
        match self {
            Party::Fixer => "fixer",
            Party::Requester => "requester",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Viewer {
    Fixer,
    Requester { requester_id: String },
}

impl Viewer {
    pub fn requester(requester_id: impl Into<String>) -> Self {
        Viewer::Requester { requester_id: requester_id.into() }
    }

    pub fn party(&self) -> Party {
        match self {
            Viewer::Fixer => Party::Fixer,
            Viewer::Requester { .. } => Party::Requester,
        }
    }

    pub fn requester_id(&self) -> Option<&str> {
        match self {
            Viewer::Fixer => None,
            Viewer::Requester { requester_id } => Some(requester_id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(Uuid);

impl SlotId {
    pub fn derive(fixer_id: &str, start: DateTime<FixedOffset>) -> Self {
        let key = format!("{}|{}", fixer_id, start.with_timezone(&Utc).to_rfc3339());
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()))
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: SlotId,
    pub fixer_id: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub state: SlotState,
}

impl Slot {
    pub fn new(fixer_id: &str, start: DateTime<FixedOffset>, state: SlotState) -> Self {
        Self {
            id: SlotId::derive(fixer_id, start),
            fixer_id: fixer_id.to_string(),
            start,
            end: start + Duration::hours(1),
            state,
        }
    }

    pub fn with_state(mut self, state: SlotState) -> Self {
        self.state = state;
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn hour(&self) -> u32 {
        self.start.hour()
    }

    /// The reconciler only hands a requester `Booked` for their own
    /// appointments, so editability follows from the state alone.
    pub fn is_editable_by(&self, _viewer: &Viewer) -> bool {
        self.state == SlotState::Booked
    }

    pub fn is_selectable_by(&self, viewer: &Viewer) -> bool {
        self.state == SlotState::Available && matches!(viewer, Viewer::Requester { .. })
    }
}
