use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};

/// The campaign resets daily at noon in UTC+8.
const TARGET_OFFSET_SECS: i32 = 8 * 3600;

fn target_zone() -> FixedOffset {
    FixedOffset::east_opt(TARGET_OFFSET_SECS).expect("UTC+8 is a valid offset")
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).expect("12:00:00 is a valid wall-clock time")
}

/// The next instant at which the wall clock in the target timezone reads
/// exactly 12:00:00. At or past noon this targets the following day, so the
/// exact-noon boundary always yields a full-day delay rather than zero.
pub fn next_noon(now: DateTime<Utc>) -> DateTime<Utc> {
    let tz = target_zone();
    let local = now.with_timezone(&tz);

    let mut date = local.date_naive();
    if local.time() >= noon() {
        date = date.succ_opt().unwrap_or(date);
    }

    match tz.from_local_datetime(&date.and_time(noon())).single() {
        Some(target) => target.with_timezone(&Utc),
        // Unreachable for a fixed offset, which never has DST gaps.
        None => now + chrono::Duration::days(1),
    }
}

pub fn time_until_next_noon(now: DateTime<Utc>) -> Duration {
    (next_noon(now) - now).to_std().unwrap_or_default()
}

/// Human-readable countdown, e.g. `2h 5m 30s`.
pub fn format_time_remaining(remaining: Duration) -> String {
    let total = remaining.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h "));
    }
    if minutes > 0 || hours > 0 {
        out.push_str(&format!("{minutes}m "));
    }
    out.push_str(&format!("{seconds}s"));
    out
}
