use std::fmt;
use std::sync::Arc;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat,
    TimeZone, Timelike, Utc, Weekday,
};
use serde::{Deserialize, Serialize};

pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Half-open hour range `[start, end)` in business-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start: u32,
    pub end: u32,
}

impl HourWindow {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.start <= hour && hour < self.end
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end && self.end <= 24
    }
}

pub const BOLIVIA_UTC_OFFSET_HOURS: i32 = -4;
pub const DEFAULT_WINDOWS: [HourWindow; 2] = [HourWindow::new(8, 12), HourWindow::new(14, 18)];
pub const DEFAULT_CANCELLATION_NOTICE_HOURS: i64 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct BusinessPolicy {
    pub business_offset: FixedOffset,
    pub backend_offset: FixedOffset,
    pub windows: Vec<HourWindow>,
    pub business_days: Vec<Weekday>,
    pub cancellation_notice: Duration,
}

impl BusinessPolicy {
    pub fn bolivia() -> Self {
        Self {
            business_offset: offset_or_utc(BOLIVIA_UTC_OFFSET_HOURS),
            backend_offset: Utc.fix(),
            windows: DEFAULT_WINDOWS.to_vec(),
            business_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            cancellation_notice: Duration::hours(DEFAULT_CANCELLATION_NOTICE_HOURS),
        }
    }

    pub fn is_within_business_hours(&self, hour: u32) -> bool {
        self.windows.iter().any(|w| w.contains(hour))
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        self.business_days.contains(&date.weekday())
    }

    pub fn business_hours(&self) -> Vec<u32> {
        (0..24).filter(|h| self.is_within_business_hours(*h)).collect()
    }

    pub fn slot_start(&self, day: NaiveDate, hour: u32) -> Option<DateTime<FixedOffset>> {
        let naive = day.and_hms_opt(hour, 0, 0)?;
        self.business_offset.from_local_datetime(&naive).single()
    }

    pub fn to_business_tz<Tz: TimeZone>(&self, instant: DateTime<Tz>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.business_offset)
    }

    pub fn to_backend(&self, instant: DateTime<FixedOffset>) -> String {
        instant
            .with_timezone(&self.backend_offset)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse_backend(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        let value = value.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Some(self.to_business_tz(parsed));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
            .and_then(|naive| self.backend_offset.from_local_datetime(&naive).single())
            .map(|instant| self.to_business_tz(instant))
    }
}

impl Default for BusinessPolicy {
    fn default() -> Self {
        Self::bolivia()
    }
}

pub fn utc_offset(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}

fn offset_or_utc(hours: i32) -> FixedOffset {
    utc_offset(hours).unwrap_or_else(|| Utc.fix())
}

#[derive(Debug, Clone)]
pub struct SlotClock {
    policy: Arc<BusinessPolicy>,
    clock: Arc<dyn Clock>,
}

impl SlotClock {
    pub fn new(policy: BusinessPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy: Arc::new(policy), clock }
    }

    pub fn system(policy: BusinessPolicy) -> Self {
        Self::new(policy, Arc::new(SystemClock))
    }

    pub fn fixed(policy: BusinessPolicy, now: DateTime<Utc>) -> Self {
        Self::new(policy, Arc::new(FixedClock(now)))
    }

    pub fn policy(&self) -> &BusinessPolicy {
        &self.policy
    }

    pub fn now_in_business_tz(&self) -> DateTime<FixedOffset> {
        self.policy.to_business_tz(self.clock.now())
    }

    pub fn today(&self) -> NaiveDate {
        self.now_in_business_tz().date_naive()
    }

    pub fn is_past_day(&self, day: NaiveDate) -> bool {
        day < self.today()
    }

    pub fn is_past_hour(&self, day: NaiveDate, hour: u32) -> bool {
        let now = self.now_in_business_tz();
        let today = now.date_naive();
        if day != today {
            return day < today;
        }
        hour < now.hour() || (hour == now.hour() && now.minute() > 0)
    }

    pub fn is_within_business_hours(&self, hour: u32) -> bool {
        self.policy.is_within_business_hours(hour)
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        self.policy.is_business_day(date)
    }

    pub fn slot_start(&self, day: NaiveDate, hour: u32) -> Option<DateTime<FixedOffset>> {
        self.policy.slot_start(day, hour)
    }
}
