//! Temporal parsing and day-precision helpers.
//!
//! Search comparisons over date fields are day-truncated, so the helpers
//! here normalize every accepted input form down to UTC day bounds.

use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::{BridgeError, Result};

/// Returns the current instant in UTC.
#[must_use]
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(raw: &str) -> Result<Date> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(raw, &format)
        .map_err(|e| BridgeError::invalid_request(format!("invalid date '{raw}': {e}")))
}

/// Parses an instant from any accepted form: RFC 3339, a naive
/// `YYYY-MM-DDTHH:MM:SS` datetime (assumed UTC), or a bare date
/// (start of day, UTC).
pub fn parse_instant(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(datetime) = OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339)
    {
        return Ok(datetime);
    }
    let naive = time::macros::format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(datetime) = PrimitiveDateTime::parse(raw, &naive) {
        return Ok(datetime.assume_utc());
    }
    parse_date(raw)
        .map(day_start)
        .map_err(|_| BridgeError::invalid_request(format!("invalid instant '{raw}'")))
}

/// The UTC instant a day begins at.
#[must_use]
pub fn day_start(date: Date) -> OffsetDateTime {
    date.midnight().assume_utc()
}

/// The UTC instant the *next* day begins at (exclusive upper bound of
/// `date`). Fails only at the calendar limit.
pub fn next_day_start(date: Date) -> Result<OffsetDateTime> {
    date.next_day()
        .map(day_start)
        .ok_or_else(|| BridgeError::invalid_request(format!("date out of range: {date}")))
}

/// Truncates an instant to the UTC day it falls on.
#[must_use]
pub fn day_of(instant: OffsetDateTime) -> Date {
    instant.to_offset(UtcOffset::UTC).date()
}
