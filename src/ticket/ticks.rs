//! Legacy timestamps: 100-nanosecond ticks since 0001-01-01T00:00:00 UTC
//! in the proleptic Gregorian calendar.

use chrono::{DateTime, Utc};

pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks at 1970-01-01T00:00:00 UTC.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Last representable tick, 9999-12-31T23:59:59.9999999.
pub const MAX_TICKS: i64 = 3_155_378_975_999_999_999;

/// Converts a tick count to a UTC instant. `None` outside `0..=MAX_TICKS`.
pub fn ticks_to_utc(ticks: i64) -> Option<DateTime<Utc>> {
    if !(0..=MAX_TICKS).contains(&ticks) {
        return None;
    }
    let since_unix = ticks - UNIX_EPOCH_TICKS;
    let secs = since_unix.div_euclid(TICKS_PER_SECOND);
    let nanos = (since_unix.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
}

/// Converts a UTC instant to ticks, truncating below 100ns.
/// `None` if the instant falls outside years 1 through 9999.
pub fn utc_to_ticks(instant: DateTime<Utc>) -> Option<i64> {
    let ticks = instant
        .timestamp()
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(i64::from(instant.timestamp_subsec_nanos() / 100))?
        .checked_add(UNIX_EPOCH_TICKS)?;
    if (0..=MAX_TICKS).contains(&ticks) {
        Some(ticks)
    } else {
        None
    }
}
