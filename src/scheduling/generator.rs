use chrono::{Datelike, Days, NaiveDate};

use crate::calendar::{Slot, SlotState, YearMonth};
use crate::scheduling::clock::SlotClock;

#[derive(Debug, Clone)]
pub struct SlotGenerator {
    clock: SlotClock,
}

impl SlotGenerator {
    pub fn new(clock: SlotClock) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &SlotClock {
        &self.clock
    }

    pub fn generate_day(&self, date: NaiveDate, fixer_id: &str) -> Vec<Slot> {
        (0..24)
            .filter_map(|hour| self.slot(date, hour, fixer_id))
            .collect()
    }

    pub fn generate_month(&self, month: u32, year: i32, fixer_id: &str) -> Vec<Slot> {
        let Some(year_month) = YearMonth::new(year, month) else {
            tracing::warn!("Ignoring slot generation for invalid month {}-{}", year, month);
            return Vec::new();
        };
        let (Some(first), Some(last)) = (year_month.first_day(), year_month.last_day()) else {
            return Vec::new();
        };

        let today = self.clock.today();
        let hours = self.clock.policy().business_hours();

        first
            .iter_days()
            .take_while(|day| *day <= last)
            .filter(|day| *day >= today && self.clock.is_business_day(*day))
            .flat_map(|day| {
                hours
                    .iter()
                    .filter_map(move |hour| self.slot(day, *hour, fixer_id))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn generate_week(&self, date: NaiveDate, fixer_id: &str) -> Vec<Slot> {
        let monday = week_start(date);
        let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(monday);
        self.generate_range(monday, sunday, fixer_id)
    }

    pub fn generate_range(&self, start: NaiveDate, end: NaiveDate, fixer_id: &str) -> Vec<Slot> {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .flat_map(|day| self.generate_day(day, fixer_id))
            .collect()
    }

    fn slot(&self, date: NaiveDate, hour: u32, fixer_id: &str) -> Option<Slot> {
        let start = self.clock.slot_start(date, hour)?;
        Some(Slot::new(fixer_id, start, self.initial_state(date, hour)))
    }

    fn initial_state(&self, date: NaiveDate, hour: u32) -> SlotState {
        let bookable = self.clock.is_business_day(date)
            && self.clock.is_within_business_hours(hour)
            && !self.clock.is_past_hour(date, hour);
        if bookable {
            SlotState::Available
        } else {
            SlotState::NotAvailable
        }
    }
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(days_from_monday))
        .unwrap_or(date)
}
