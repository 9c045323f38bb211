//! Rehydration of run-length-compressed capture rows.
//!
//! To save space at source, a capture may record a single row with a
//! `repeat_count` of `n` instead of `n` identical consecutive samples.
//! Rehydration reverses that: it expands the row into `n` rows whose
//! timestamps are evenly spaced at the table's nominal sample interval,
//! advanced with an explicit cursor value rather than any clock.
//!
//! Two row classes never come back out:
//!
//! - tombstones, i.e. rows whose `deleted` field is non-empty;
//! - rows whose `repeat_count` literal is present but empty, unparseable,
//!   or implausibly large, which are dropped with a warning rather than
//!   aborting the table (MDT-91238).
//!
//! Every expanded row carries a repeat field forced to `"1"`, so output
//! tables never re-expand, and every synthetic row is an independent copy
//! of the original.

use std::path::Path;

use chrono::NaiveDateTime;
use log::warn;

use crate::{
    capture::{ReservedColumns, Row},
    timefmt,
};

/// Largest repeat count accepted as genuine compression. At the fastest
/// sample interval (20s) this already spans more than seven months of
/// omitted samples; anything beyond it is a corrupt literal, and expanding
/// it would exhaust memory before the table could fail cleanly.
const MAX_REPEAT_COUNT: u64 = 1_000_000;

/// Expands compressed rows for one capture.
///
/// Carries the capture's reserved-column indices and resolved sample
/// interval; each [`Rehydrator::expand`] call is independent.
#[derive(Debug, Clone, Copy)]
pub struct Rehydrator {
    reserved: ReservedColumns,
    interval_seconds: u32,
}

impl Rehydrator {
    /// Build a rehydrator for a capture with the given reserved columns
    /// and sample interval.
    pub fn new(reserved: ReservedColumns, interval_seconds: u32) -> Self {
        Self {
            reserved,
            interval_seconds,
        }
    }

    /// Expand one row into `1..=repeat_count` timestamped rows.
    ///
    /// `ts` is the row's already-parsed timestamp and `line` its 1-based
    /// position in `path`, used only for warning context. The original row
    /// is yielded first (its timestamp literal untouched), followed by
    /// `repeat_count - 1` synthetic successors at `interval_seconds` steps,
    /// identical in every field except the timestamp. Tombstones and rows
    /// whose repeat literal is empty, unparseable, or implausibly large
    /// yield nothing.
    pub fn expand(
        &self,
        mut row: Row,
        ts: NaiveDateTime,
        path: &Path,
        line: u64,
    ) -> Vec<(NaiveDateTime, Row)> {
        if let Some(deleted) = self.reserved.deleted {
            // Tombstone flags are encoded as empty-vs-set, so any non-empty
            // literal marks the row deleted.
            if !row[deleted].is_empty() {
                return Vec::new();
            }
        }

        let repeat_count = match self.reserved.repeat_count {
            Some(repeat) => {
                let literal = row[repeat].trim();
                if literal.is_empty() {
                    warn!(
                        "Row {line} of {} has an empty repeat_count value, dropping: \"{}\"",
                        path.display(),
                        row.join(",")
                    );
                    return Vec::new();
                }
                let Ok(count) = literal.parse::<u64>() else {
                    warn!(
                        "Row {line} of {} has an unparseable repeat_count '{literal}', dropping",
                        path.display()
                    );
                    return Vec::new();
                };
                if count > MAX_REPEAT_COUNT {
                    warn!(
                        "Row {line} of {} has an implausible repeat_count {count}, dropping",
                        path.display()
                    );
                    return Vec::new();
                }
                // Rehydrated rows must never re-expand downstream.
                row[repeat] = "1".to_string();
                count
            }
            None => 1,
        };

        let mut expanded = Vec::with_capacity(repeat_count.max(1) as usize);
        let mut cursor = ts;
        for _ in 1..repeat_count {
            cursor = timefmt::advance(cursor, self.interval_seconds);
            let mut synthetic = row.clone();
            synthetic[self.reserved.timestamp] = timefmt::render_timestamp(cursor);
            expanded.push((cursor, synthetic));
        }
        expanded.insert(0, (ts, row));
        expanded
    }
}
