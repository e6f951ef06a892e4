//! Time utilities: lenient ISO parsing and timezone-aware "now".

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a naive ISO date or date-time. A bare date resolves to midnight.
/// Offset-carrying timestamps are not accepted.
pub fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_iso(s).map(|dt| dt.date()))
}

/// Whole days from `now` to `deadline`, floored (so yesterday is -1 even if
/// only a few hours have passed).
pub fn days_until(deadline: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (deadline - now).num_seconds().div_euclid(86_400)
}

/// "HH:MM" -> minutes since midnight.
pub fn parse_hhmm(s: &str) -> Option<u32> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .ok()
        .map(|t| t.signed_duration_since(NaiveTime::MIN).num_minutes() as u32)
}

pub fn format_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Wall-clock time in an IANA timezone such as "Asia/Kolkata".
pub fn local_now(tz: &str) -> Result<NaiveDateTime> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(Utc::now().with_timezone(&tz).naive_local())
}

/// Same as [`local_now`] but fixed to a given instant, for tests and replay.
pub fn local_at(instant: DateTime<Utc>, tz: &str) -> Result<NaiveDateTime> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(instant.with_timezone(&tz).naive_local())
}

/// Minute-resolution stamp without colons, e.g. "2026-03-01T09-30".
pub fn id_stamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H-%M").to_string()
}
