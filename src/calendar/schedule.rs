use chrono::{DateTime, FixedOffset};

use super::appointment::ScheduleState;
use super::slot::Party;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRecord {
    pub starting_time: DateTime<FixedOffset>,
    pub finishing_time: DateTime<FixedOffset>,
    pub schedule_state: ScheduleState,
    pub requester_id: Option<String>,
    pub cancelled_by: Option<Party>,
}

impl ScheduleRecord {
    pub fn booked(starting_time: DateTime<FixedOffset>, requester_id: &str) -> Self {
        Self {
            starting_time,
            finishing_time: starting_time + chrono::Duration::hours(1),
            schedule_state: ScheduleState::Booked,
            requester_id: Some(requester_id.to_string()),
            cancelled_by: None,
        }
    }

    pub fn cancelled(
        starting_time: DateTime<FixedOffset>,
        requester_id: &str,
        cancelled_by: Option<Party>,
    ) -> Self {
        Self {
            schedule_state: ScheduleState::Cancelled,
            cancelled_by,
            ..Self::booked(starting_time, requester_id)
        }
    }

    pub fn belongs_to(&self, requester_id: &str) -> bool {
        self.requester_id.as_deref() == Some(requester_id)
    }
}
