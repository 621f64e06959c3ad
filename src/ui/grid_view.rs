use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate};

use crate::calendar::{Slot, SlotState, YearMonth};
use crate::scheduling::generator::week_start;

#[derive(Debug, Clone, PartialEq)]
pub struct SlotCell {
    pub start: DateTime<FixedOffset>,
    pub hour: u32,
    pub state: SlotState,
    pub is_cursor: bool,
}

impl SlotCell {
    fn from_slot(slot: &Slot, cursor: Option<DateTime<FixedOffset>>) -> Self {
        Self {
            start: slot.start,
            hour: slot.hour(),
            state: slot.state,
            is_cursor: cursor == Some(slot.start),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthLayout {
    pub month: YearMonth,
    pub weeks: Vec<Vec<MonthDay>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub is_selected: bool,
    pub open: usize,
    pub booked: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekLayout {
    pub week_start: NaiveDate,
    pub hours: Vec<u32>,
    pub days: Vec<DayColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub is_today: bool,
    pub is_selected: bool,
    pub cells: Vec<SlotCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayLayout {
    pub date: NaiveDate,
    pub is_today: bool,
    pub cells: Vec<SlotCell>,
}

pub fn month_layout(slots: &[Slot], selected: NaiveDate, today: NaiveDate) -> MonthLayout {
    let month = YearMonth::containing(selected);
    let (Some(first), Some(last)) = (month.first_day(), month.last_day()) else {
        return MonthLayout { month, weeks: Vec::new() };
    };

    let mut weeks = Vec::new();
    let mut day = week_start(first);
    while day <= last {
        let week: Vec<MonthDay> = day
            .iter_days()
            .take(7)
            .map(|date| month_day(slots, date, month, selected, today))
            .collect();
        weeks.push(week);
        let Some(next) = day.checked_add_days(Days::new(7)) else { break };
        day = next;
    }

    MonthLayout { month, weeks }
}

fn month_day(slots: &[Slot], date: NaiveDate, month: YearMonth, selected: NaiveDate, today: NaiveDate) -> MonthDay {
    let count = |wanted: fn(SlotState) -> bool| {
        slots
            .iter()
            .filter(|s| s.date() == date && wanted(s.state))
            .count()
    };
    MonthDay {
        date,
        in_month: date.month() == month.month && date.year() == month.year,
        is_today: date == today,
        is_selected: date == selected,
        open: count(|state| state == SlotState::Available),
        booked: count(|state| state == SlotState::Booked),
        cancelled: count(|state| state.is_cancelled()),
    }
}

pub fn week_layout(
    slots: &[Slot],
    selected: NaiveDate,
    cursor: Option<DateTime<FixedOffset>>,
    today: NaiveDate,
    hours: &[u32],
) -> WeekLayout {
    let monday = week_start(selected);
    let days = monday
        .iter_days()
        .take(7)
        .map(|date| DayColumn {
            date,
            is_today: date == today,
            is_selected: date == selected,
            cells: cells_for(slots, date, cursor, hours),
        })
        .collect();

    WeekLayout {
        week_start: monday,
        hours: hours.to_vec(),
        days,
    }
}

pub fn day_layout(
    slots: &[Slot],
    date: NaiveDate,
    cursor: Option<DateTime<FixedOffset>>,
    today: NaiveDate,
    hours: &[u32],
) -> DayLayout {
    DayLayout {
        date,
        is_today: date == today,
        cells: cells_for(slots, date, cursor, hours),
    }
}

fn cells_for(
    slots: &[Slot],
    date: NaiveDate,
    cursor: Option<DateTime<FixedOffset>>,
    hours: &[u32],
) -> Vec<SlotCell> {
    slots
        .iter()
        .filter(|slot| slot.date() == date && hours.contains(&slot.hour()))
        .map(|slot| SlotCell::from_slot(slot, cursor))
        .collect()
}
