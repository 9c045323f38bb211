//! Parsing and synthesis of capture timestamp literals.
//!
//! Capture files carry timestamps as `YYYY-MM-DD HH:MM:SS` optionally
//! followed by fractional seconds (`.ffffff`) and/or a timezone offset
//! (`+HH:MM`). Both suffixes are accepted and discarded: all timestamps
//! are treated as UTC with second resolution, which is the resolution the
//! sampling intervals are defined at.
//!
//! Synthetic timestamps produced during rehydration are rendered in the
//! canonical archive form `YYYY-MM-DD HH:MM:SS+00:00`.

use chrono::{Duration, NaiveDateTime};
use snafu::Snafu;

/// Format accepted after fractional seconds and offset have been stripped.
const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used when a timestamp is written back into a synthetic row.
const RENDER_FORMAT: &str = "%Y-%m-%d %H:%M:%S+00:00";

/// A timestamp literal that does not match the capture format.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(display("Invalid timestamp literal '{literal}'"))]
pub struct ParseTimestampError {
    /// The literal that failed to parse.
    pub literal: String,
}

/// Parse a capture timestamp literal into a UTC-naive datetime.
///
/// Fractional seconds and a trailing `+HH:MM` offset are ignored; the
/// offset is assumed to be zero because archive timestamps are always
/// recorded in UTC.
///
/// # Errors
///
/// Returns [`ParseTimestampError`] when the literal (after stripping the
/// optional suffixes) is not `YYYY-MM-DD HH:MM:SS`.
pub fn parse_timestamp(literal: &str) -> Result<NaiveDateTime, ParseTimestampError> {
    // Strip the offset first, then fractional seconds. Dates contain '-'
    // but never '+', so splitting on '+' is unambiguous.
    let without_offset = literal.split('+').next().unwrap_or(literal);
    let without_fraction = without_offset.split('.').next().unwrap_or(without_offset);

    NaiveDateTime::parse_from_str(without_fraction.trim(), PARSE_FORMAT).map_err(|_| {
        ParseTimestampError {
            literal: literal.to_string(),
        }
    })
}

/// Render a datetime in the canonical archive form, UTC offset included.
pub fn render_timestamp(ts: NaiveDateTime) -> String {
    ts.format(RENDER_FORMAT).to_string()
}

/// Advance a timestamp cursor by a whole number of seconds.
///
/// This is the arithmetic step used by rehydration: purely computed,
/// never consulting a clock.
pub fn advance(ts: NaiveDateTime, interval_seconds: u32) -> NaiveDateTime {
    ts + Duration::seconds(i64::from(interval_seconds))
}
