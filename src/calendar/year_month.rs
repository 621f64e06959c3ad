use std::fmt;

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.next().first_day().and_then(|d| d.pred_opt())
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn spanning(start: NaiveDate, end: NaiveDate) -> Vec<Self> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let last = Self::containing(end);
        let mut months = vec![Self::containing(start)];
        while let Some(current) = months.last().copied()
            && current < last
        {
            months.push(current.next());
        }
        months
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn rejects_invalid_month() {
        assert!(YearMonth::new(2025, 13).is_none());
        assert!(YearMonth::new(2025, 0).is_none());
    }

    #[test]
    fn formats_as_year_dash_month() {
        assert_eq!(YearMonth::new(2025, 3).unwrap().to_string(), "2025-03");
    }

    #[test]
    fn last_day_handles_leap_february() {
        let feb = YearMonth::new(2024, 2).unwrap();
        assert_eq!(feb.last_day(), Some(date(2024, 2, 29)));
    }

    #[test]
    fn next_and_previous_wrap_years() {
        let dec = YearMonth::new(2024, 12).unwrap();
        assert_eq!(dec.next(), YearMonth::new(2025, 1).unwrap());
        assert_eq!(dec.next().previous(), dec);
    }

    #[test]
    fn spanning_a_week_across_months_returns_both() {
        let months = YearMonth::spanning(date(2025, 1, 27), date(2025, 2, 2));
        assert_eq!(months, vec![YearMonth::new(2025, 1).unwrap(), YearMonth::new(2025, 2).unwrap()]);
    }

    #[test]
    fn spanning_a_single_day_returns_one_month() {
        let months = YearMonth::spanning(date(2025, 1, 15), date(2025, 1, 15));
        assert_eq!(months.len(), 1);
    }
}
