use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::calendar::{Slot, SlotState};

#[derive(Debug, Clone, PartialEq)]
pub struct DayList {
    pub date: NaiveDate,
    pub title: String,
    pub is_today: bool,
    pub entries: Vec<DayListEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DayListEntry {
    Slot(SlotRow),
    /// A run of consecutive unbookable hours, `from` inclusive, `to` exclusive.
    Closed { from: u32, to: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotRow {
    pub start: DateTime<FixedOffset>,
    pub time_label: String,
    pub state: SlotState,
    pub is_cursor: bool,
}

impl SlotRow {
    pub fn from_slot(slot: &Slot, cursor: Option<DateTime<FixedOffset>>) -> Self {
        Self {
            start: slot.start,
            time_label: format!("{} - {}", slot.start.format("%H:%M"), slot.end.format("%H:%M")),
            state: slot.state,
            is_cursor: cursor == Some(slot.start),
        }
    }
}

impl DayListEntry {
    pub fn time_label(&self) -> String {
        match self {
            DayListEntry::Slot(row) => row.time_label.clone(),
            DayListEntry::Closed { from, to } => format!("{:02}:00 - {:02}:00", from, to),
        }
    }
}

pub fn calculate_layout(
    slots: &[Slot],
    date: NaiveDate,
    cursor: Option<DateTime<FixedOffset>>,
    today: NaiveDate,
) -> DayList {
    let mut entries: Vec<DayListEntry> = Vec::new();

    for slot in slots.iter().filter(|s| s.date() == date) {
        if slot.state == SlotState::NotAvailable && cursor != Some(slot.start) {
            let hour = slot.hour();
            if let Some(DayListEntry::Closed { to, .. }) = entries.last_mut()
                && *to == hour
            {
                *to = hour + 1;
                continue;
            }
            entries.push(DayListEntry::Closed { from: hour, to: hour + 1 });
        } else {
            entries.push(DayListEntry::Slot(SlotRow::from_slot(slot, cursor)));
        }
    }

    DayList {
        date,
        title: date.format("%A, %d %B").to_string(),
        is_today: date == today,
        entries,
    }
}
