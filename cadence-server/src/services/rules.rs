//! Typed schedule rules.
//!
//! Rule rows arrive with loosely typed text/JSON columns. They are decoded
//! here exactly once into a [`ScheduleRule`]; expansion and materialization
//! never look at the raw columns again.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::ScheduleRuleRow;

#[derive(Debug, Clone)]
pub struct ScheduleRule {
    pub id: i32,
    pub brand_id: i32,
    pub subcategory_id: i32,
    pub name: String,
    pub is_active: bool,
    pub channels: Vec<String>,
    pub recurrence: Recurrence,
    pub image_tags: ImageTagRule,
    pub hashtags: HashtagRule,
    pub settings: RuleSettings,
}

impl ScheduleRule {
    /// The first configured channel; drafts carry it in their legacy
    /// single-channel field and asset eligibility is judged against it.
    pub fn first_channel(&self) -> &str {
        self.channels.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recurrence {
    Daily {
        time: NaiveTime,
    },
    Weekly {
        days: Vec<Weekday>,
        time: NaiveTime,
    },
    Monthly {
        day: MonthlyDay,
        time: NaiveTime,
    },
    Specific(SpecificOccurrence),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonthlyDay {
    DayOfMonth(u32),
    /// Nth (1-based) occurrence of a weekday within the month.
    NthWeekday { nth: u32, weekday: Weekday },
}

/// One real-world occurrence with optional lead-time and in-event offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecificOccurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Days before `start` at which a reminder slot is due.
    pub days_before: Vec<u32>,
    /// Days after `start` (while the occurrence is running) to post on.
    pub days_during: Vec<u32>,
    pub times: Vec<NaiveTime>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagMatch {
    #[default]
    Any,
    All,
}

/// Which catalog assets a rule may draw from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageTagRule {
    #[default]
    Any,
    Tags {
        tags: Vec<String>,
        #[serde(default, rename = "match")]
        mode: TagMatch,
    },
    /// Assets tagged with the rule's subcategory name.
    Subcategory,
}

/// Where a draft's hashtags come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HashtagRule {
    None,
    Fixed {
        tags: Vec<String>,
    },
    Subcategory,
    Generated {
        #[serde(default)]
        max: Option<usize>,
    },
}

impl Default for HashtagRule {
    fn default() -> Self {
        Self::Generated { max: None }
    }
}

/// Free-form generation preferences handed through to the caption generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSettings {
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub cta: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl TryFrom<&ScheduleRuleRow> for ScheduleRule {
    type Error = ScheduleError;

    fn try_from(row: &ScheduleRuleRow) -> ScheduleResult<Self> {
        parse_rule(row)
    }
}

pub fn parse_rule(row: &ScheduleRuleRow) -> ScheduleResult<ScheduleRule> {
    let id = row.id;
    let channels = parse_channels(&row.channels).map_err(|e| ScheduleError::rule(id, e))?;
    if channels.is_empty() {
        return Err(ScheduleError::rule(id, "no channels configured"));
    }

    let recurrence = parse_recurrence(row)?;

    let image_tags = parse_json_column(id, "image_tag_rule", row.image_tag_rule.as_deref())?;
    let hashtags = parse_json_column(id, "hashtag_rule", row.hashtag_rule.as_deref())?;
    let settings = parse_json_column(id, "settings", row.settings.as_deref())?;

    Ok(ScheduleRule {
        id,
        brand_id: row.brand_id,
        subcategory_id: row.subcategory_id,
        name: row.name.clone(),
        is_active: row.is_active,
        channels,
        recurrence,
        image_tags,
        hashtags,
        settings,
    })
}

fn parse_recurrence(row: &ScheduleRuleRow) -> ScheduleResult<Recurrence> {
    let id = row.id;
    let fail = |reason: String| ScheduleError::rule(id, reason);

    let weekly_set = row.days_of_week.as_deref().is_some_and(|s| !s.trim().is_empty());
    let monthly_set = row.day_of_month.is_some() || row.nth_week.is_some() || row.weekday.is_some();
    let specific_set = [
        &row.start_date,
        &row.end_date,
        &row.days_before,
        &row.days_during,
    ]
    .iter()
    .any(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()));

    let frequency = row.frequency.trim().to_lowercase();
    let foreign = match frequency.as_str() {
        "daily" => [("weekly", weekly_set), ("monthly", monthly_set), ("specific", specific_set)],
        "weekly" => [("daily", false), ("monthly", monthly_set), ("specific", specific_set)],
        "monthly" => [("daily", false), ("weekly", weekly_set), ("specific", specific_set)],
        "specific" => [("daily", false), ("weekly", weekly_set), ("monthly", monthly_set)],
        other => return Err(fail(format!("unknown frequency '{}'", other))),
    };
    if let Some((group, _)) = foreign.iter().find(|(_, set)| *set) {
        return Err(fail(format!(
            "{} rule carries {} fields",
            frequency, group
        )));
    }

    let times = parse_times(&row.time_of_day).map_err(fail)?;
    let single_time = || -> ScheduleResult<NaiveTime> {
        match times.as_slice() {
            [time] => Ok(*time),
            _ => Err(ScheduleError::rule(
                id,
                "only specific rules accept a list of times",
            )),
        }
    };

    match frequency.as_str() {
        "daily" => Ok(Recurrence::Daily {
            time: single_time()?,
        }),
        "weekly" => {
            let days = parse_weekdays(row.days_of_week.as_deref().unwrap_or_default())
                .map_err(fail)?;
            if days.is_empty() {
                return Err(fail("weekly rule has no days_of_week".to_string()));
            }
            Ok(Recurrence::Weekly {
                days,
                time: single_time()?,
            })
        }
        "monthly" => {
            let day = match (row.day_of_month, row.nth_week, row.weekday) {
                (Some(day), None, None) => {
                    if !(1..=31).contains(&day) {
                        return Err(fail(format!("day_of_month {} out of range", day)));
                    }
                    MonthlyDay::DayOfMonth(day as u32)
                }
                (None, Some(nth), Some(weekday)) => {
                    if !(1..=5).contains(&nth) {
                        return Err(fail(format!("nth_week {} out of range", nth)));
                    }
                    let weekday = weekday_from_number(weekday as i64)
                        .ok_or_else(|| fail(format!("weekday {} out of range", weekday)))?;
                    MonthlyDay::NthWeekday {
                        nth: nth as u32,
                        weekday,
                    }
                }
                _ => {
                    return Err(fail(
                        "monthly rule needs either day_of_month or nth_week with weekday"
                            .to_string(),
                    ))
                }
            };
            Ok(Recurrence::Monthly {
                day,
                time: single_time()?,
            })
        }
        _ => {
            let start_raw = row
                .start_date
                .as_deref()
                .ok_or_else(|| fail("specific rule has no start_date".to_string()))?;
            let start = parse_instant(start_raw).map_err(fail)?;
            let end = match row.end_date.as_deref() {
                Some(raw) if !raw.trim().is_empty() => parse_instant(raw).map_err(fail)?,
                _ => start,
            };
            if end < start {
                return Err(fail("end_date precedes start_date".to_string()));
            }
            if times.is_empty() {
                return Err(fail("specific rule has no time_of_day".to_string()));
            }

            Ok(Recurrence::Specific(SpecificOccurrence {
                start,
                end,
                days_before: parse_offsets(row.days_before.as_deref()).map_err(fail)?,
                days_during: parse_offsets(row.days_during.as_deref()).map_err(fail)?,
                times,
            }))
        }
    }
}

fn parse_json_column<T>(rule_id: i32, column: &str, raw: Option<&str>) -> ScheduleResult<T>
where
    T: Default + serde::de::DeserializeOwned,
{
    match raw.map(str::trim) {
        None | Some("") | Some("null") => Ok(T::default()),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| ScheduleError::rule(rule_id, format!("{}: {}", column, e))),
    }
}

/// Channels are stored as a JSON array; a plain comma-separated list is
/// accepted too.
pub fn parse_channels(raw: &str) -> Result<Vec<String>, String> {
    let raw = raw.trim();
    let items: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw).map_err(|e| format!("channels: {}", e))?
    } else {
        raw.split(',').map(str::to_string).collect()
    };

    let mut channels: Vec<String> = Vec::new();
    for item in items {
        let channel = item.trim().to_lowercase();
        if !channel.is_empty() && !channels.contains(&channel) {
            channels.push(channel);
        }
    }
    Ok(channels)
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| format!("invalid time '{}'", raw))
}

/// `"09:00"` or `["09:00", "17:30"]`. Order is kept, duplicates dropped.
fn parse_times(raw: &str) -> Result<Vec<NaiveTime>, String> {
    let raw = raw.trim();
    let items: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw).map_err(|e| format!("time_of_day: {}", e))?
    } else {
        vec![raw.to_string()]
    };

    let mut times = Vec::with_capacity(items.len());
    for item in &items {
        let time = parse_time(item)?;
        if !times.contains(&time) {
            times.push(time);
        }
    }
    Ok(times)
}

/// Weekday numbering follows 0 = Sunday .. 6 = Saturday; 7 is also Sunday.
pub fn weekday_from_number(n: i64) -> Option<Weekday> {
    match n {
        0 | 7 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// JSON array of weekday numbers or English names (`"mon"`, `"Thursday"`).
fn parse_weekdays(raw: &str) -> Result<Vec<Weekday>, String> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(raw.trim()).map_err(|e| format!("days_of_week: {}", e))?;

    let mut days = Vec::with_capacity(values.len());
    for value in values {
        let day = match &value {
            serde_json::Value::Number(n) => n.as_i64().and_then(weekday_from_number),
            serde_json::Value::String(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(weekday_from_number)
                .or_else(|| s.trim().parse::<Weekday>().ok()),
            _ => None,
        }
        .ok_or_else(|| format!("invalid weekday {}", value))?;

        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(days)
}

fn parse_offsets(raw: Option<&str>) -> Result<Vec<u32>, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") | Some("null") => return Ok(Vec::new()),
        Some(raw) => raw,
    };
    let values: Vec<i64> = serde_json::from_str(raw).map_err(|e| format!("offsets: {}", e))?;

    let mut offsets = Vec::with_capacity(values.len());
    for value in values {
        let offset = u32::try_from(value).map_err(|_| format!("negative offset {}", value))?;
        if !offsets.contains(&offset) {
            offsets.push(offset);
        }
    }
    Ok(offsets)
}

/// Parse an occurrence boundary into a UTC instant.
///
/// Values carrying a zone (`Z` or `+hh:mm`) are honoured. A bare date is the
/// UTC midnight of that date. A date-time without a zone is read as UTC and
/// logged, since its intended zone cannot be recovered.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            tracing::warn!("date '{}' has no zone suffix; reading it as UTC", raw);
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(format!("invalid date '{}'", raw))
}
