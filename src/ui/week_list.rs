use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::calendar::{Slot, SlotState};
use crate::scheduling::generator::week_start;
use crate::ui::day_list::SlotRow;

#[derive(Debug, Clone, PartialEq)]
pub struct WeekList {
    pub week_start: NaiveDate,
    pub title: String,
    pub days: Vec<WeekListDay>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekListDay {
    pub date: NaiveDate,
    pub label: String,
    pub is_today: bool,
    pub is_selected: bool,
    pub rows: Vec<SlotRow>,
}

impl WeekListDay {
    pub fn open_count(&self) -> usize {
        self.rows.iter().filter(|r| r.state == SlotState::Available).count()
    }
}

pub fn calculate_layout(
    slots: &[Slot],
    selected: NaiveDate,
    cursor: Option<DateTime<FixedOffset>>,
    today: NaiveDate,
) -> WeekList {
    let monday = week_start(selected);
    let days: Vec<WeekListDay> = monday
        .iter_days()
        .take(7)
        .map(|date| WeekListDay {
            date,
            label: date.format("%a %d").to_string(),
            is_today: date == today,
            is_selected: date == selected,
            rows: slots
                .iter()
                .filter(|s| s.date() == date && s.state != SlotState::NotAvailable)
                .map(|s| SlotRow::from_slot(s, cursor))
                .collect(),
        })
        .collect();

    let sunday = days.last().map(|d| d.date).unwrap_or(monday);
    WeekList {
        week_start: monday,
        title: format!("{} - {}", monday.format("%d %b"), sunday.format("%d %b %Y")),
        days,
    }
}
