//! Brand-local wall clock <-> UTC conversion.
//!
//! Offsets are always taken from the tz database at the slot's own date, so a
//! 09:00 slot stays at 09:00 local across DST changes.
//!
//! DST policy:
//! - a wall-clock time skipped by a forward transition (e.g. 02:30 on a
//!   spring-forward night) keeps the offset in force before the gap, which
//!   lands it on the equivalent post-transition wall time (03:30);
//! - a wall-clock time that occurs twice during a backward transition resolves
//!   to the earlier instant.

use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{ScheduleError, ScheduleResult};

pub fn parse_zone(zone: &str) -> ScheduleResult<Tz> {
    zone.trim()
        .parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(zone.to_string()))
}

pub fn local_to_utc(local: NaiveDateTime, zone: &str) -> ScheduleResult<DateTime<Utc>> {
    let tz = parse_zone(zone)?;
    Ok(resolve_local(local, tz))
}

pub fn utc_to_local(instant: DateTime<Utc>, zone: &str) -> ScheduleResult<NaiveDateTime> {
    let tz = parse_zone(zone)?;
    Ok(instant.with_timezone(&tz).naive_local())
}

/// Interpret `local` as wall-clock time in `tz`.
pub fn resolve_local(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    use chrono::LocalResult;

    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let offset = offset_before_gap(local, tz);
            Utc.from_utc_datetime(&(local - offset))
        }
    }
}

fn offset_before_gap(local: NaiveDateTime, tz: Tz) -> Duration {
    for hours in 1..=24 {
        let earlier = local - Duration::hours(hours);
        if let Some(dt) = tz.from_local_datetime(&earlier).earliest() {
            return Duration::seconds(dt.offset().fix().local_minus_utc() as i64);
        }
    }
    Duration::zero()
}

/// A brand zone resolved once per batch.
#[derive(Debug, Clone)]
pub struct BrandZone {
    pub tz: Tz,
    /// Name recorded on post jobs (`scheduled_tz`).
    pub name: String,
    /// Set when the configured zone was unusable and UTC stands in for it.
    pub degraded: bool,
}

impl BrandZone {
    /// Resolve `zone`, degrading to UTC on an unknown identifier.
    pub fn resolve_or_utc(zone: &str) -> Self {
        match parse_zone(zone) {
            Ok(tz) => Self {
                tz,
                name: tz.name().to_string(),
                degraded: false,
            },
            Err(e) => {
                tracing::warn!("{}; treating local slot times as UTC", e);
                Self {
                    tz: chrono_tz::UTC,
                    name: "UTC".to_string(),
                    degraded: true,
                }
            }
        }
    }

    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        resolve_local(local, self.tz)
    }
}
