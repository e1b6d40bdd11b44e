//! Expansion of schedule rules into the local (date, time) slots of one
//! calendar month.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::services::rules::{MonthlyDay, Recurrence, ScheduleRule, SpecificOccurrence};

/// One concrete slot in brand-local wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl TimeSlot {
    pub fn local(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date, self.time.format("%H:%M"))
    }
}

/// A target calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    first: NaiveDate,
    last: NaiveDate,
}

impl MonthWindow {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = first.checked_add_months(chrono::Months::new(1))?;
        let last = next.pred_opt()?;
        Some(Self { first, last })
    }

    /// Accepts `YYYY-MM-01` (any valid day selects its month) or `YYYY-MM`.
    pub fn parse(target: &str) -> Result<Self, String> {
        let target = target.trim();
        let date = NaiveDate::parse_from_str(target, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", target), "%Y-%m-%d"))
            .map_err(|_| format!("unparseable target month '{}'", target))?;
        Self::new(date.year(), date.month())
            .ok_or_else(|| format!("target month '{}' out of range", target))
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn days_in_month(&self) -> u32 {
        self.last.day()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let (year, month) = (self.year(), self.month());
        (1..=self.days_in_month()).filter_map(move |d| NaiveDate::from_ymd_opt(year, month, d))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first && date <= self.last
    }

    /// First instant of the month, UTC.
    pub fn start_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.first.and_time(NaiveTime::MIN))
    }

    /// Last millisecond of the month, UTC.
    pub fn end_instant(&self) -> DateTime<Utc> {
        let next = self.last.succ_opt().unwrap_or(self.last);
        Utc.from_utc_datetime(&next.and_time(NaiveTime::MIN)) - Duration::milliseconds(1)
    }

    pub fn label(&self) -> String {
        self.first.format("%Y-%m").to_string()
    }
}

/// Ordered, de-duplicated slots `rule` implies for `window`. Months a rule
/// does not apply to yield nothing rather than an error.
pub fn expand_month(rule: &ScheduleRule, window: &MonthWindow) -> Vec<TimeSlot> {
    if !rule.is_active {
        return Vec::new();
    }

    let mut slots = match &rule.recurrence {
        Recurrence::Daily { time } => window.days().map(|date| slot(date, *time)).collect(),
        Recurrence::Weekly { days, time } => window
            .days()
            .filter(|date| days.contains(&date.weekday()))
            .map(|date| slot(date, *time))
            .collect(),
        Recurrence::Monthly { day, time } => monthly_date(*day, window)
            .map(|date| vec![slot(date, *time)])
            .unwrap_or_default(),
        Recurrence::Specific(occurrence) => expand_specific(rule.id, occurrence, window),
    };

    slots.sort();
    slots.dedup();
    slots
}

fn slot(date: NaiveDate, time: NaiveTime) -> TimeSlot {
    TimeSlot { date, time }
}

fn monthly_date(day: MonthlyDay, window: &MonthWindow) -> Option<NaiveDate> {
    match day {
        MonthlyDay::DayOfMonth(d) => NaiveDate::from_ymd_opt(window.year(), window.month(), d),
        MonthlyDay::NthWeekday { nth, weekday } => window
            .days()
            .filter(|date| date.weekday() == weekday)
            .nth(nth.saturating_sub(1) as usize),
    }
}

fn expand_specific(
    rule_id: i32,
    occurrence: &SpecificOccurrence,
    window: &MonthWindow,
) -> Vec<TimeSlot> {
    let month_start = window.start_instant();
    let month_end = window.end_instant();

    let has_direct_overlap = occurrence.start <= month_end && occurrence.end >= month_start;
    let has_days_before_overlap = !has_direct_overlap
        && occurrence.days_before.iter().any(|days| {
            let at = occurrence.start - Duration::days(i64::from(*days));
            at >= month_start && at <= month_end
        });

    // Without this guard a single occurrence would be expanded into every
    // month it is queried for.
    if !has_direct_overlap && !has_days_before_overlap {
        tracing::trace!(rule_id, month = %window.label(), "specific rule outside month");
        return Vec::new();
    }

    let start_day = occurrence.start.date_naive();
    let end_day = occurrence.end.date_naive();
    let mut dates = Vec::new();

    for days in &occurrence.days_before {
        if let Some(date) = start_day.checked_sub_days(Days::new(u64::from(*days))) {
            if window.contains(date) {
                dates.push(date);
            }
        }
    }

    let during_applies = occurrence.start < occurrence.end && !occurrence.days_during.is_empty();
    if during_applies {
        for days in &occurrence.days_during {
            if let Some(date) = start_day.checked_add_days(Days::new(u64::from(*days))) {
                if date <= end_day && window.contains(date) {
                    dates.push(date);
                }
            }
        }
    }

    // The event day itself is a slot only when no offset list drives the rule.
    if occurrence.days_before.is_empty() && !during_applies && window.contains(start_day) {
        dates.push(start_day);
    }

    dates
        .into_iter()
        .flat_map(|date| occurrence.times.iter().map(move |time| slot(date, *time)))
        .collect()
}
