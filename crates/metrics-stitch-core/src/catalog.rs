//! Per-table sample-interval resolution.
//!
//! Rehydration needs to know the nominal seconds between samples for each
//! logical table. An archive may ship a JSON catalog mapping table names to
//! `{ "interval_seconds": <n> }`; when the catalog (or an entry, or the
//! `interval_seconds` field) is absent the interval is derived from the
//! table's naming convention instead. Resolution never fails: every
//! degraded path is logged once and falls through to the heuristic.

use std::{collections::HashMap, path::Path};

use log::warn;
use serde::Deserialize;

const TWENTY_SECONDS: u32 = 20;
const ONE_MINUTE_IN_SECS: u32 = 60;
const FIVE_MINUTES_IN_SECS: u32 = 5 * ONE_MINUTE_IN_SECS;
const ONE_HOUR_IN_SECS: u32 = 60 * ONE_MINUTE_IN_SECS;
const ONE_DAY_IN_SECS: u32 = 24 * ONE_HOUR_IN_SECS;

/// Table-name suffixes and the interval they imply, checked in order.
const SUFFIX_INTERVALS: [(&str, u32); 4] = [
    ("_twenty_seconds", TWENTY_SECONDS),
    ("_five_mins", FIVE_MINUTES_IN_SECS),
    ("_one_hour", ONE_HOUR_IN_SECS),
    ("_one_day", ONE_DAY_IN_SECS),
];

/// One catalog entry. Catalogs carry other per-table properties too;
/// everything but the interval is ignored here.
#[derive(Debug, Clone, Deserialize)]
struct CatalogEntry {
    interval_seconds: Option<u32>,
}

/// Resolves the nominal seconds between samples for a logical table.
///
/// Built from an optional JSON catalog file; absence of the file, of a
/// table's entry, or of the entry's `interval_seconds` field all fall back
/// to [`IntervalCatalog::interval_from_table_name`].
#[derive(Debug, Default)]
pub struct IntervalCatalog {
    entries: Option<HashMap<String, CatalogEntry>>,
}

impl IntervalCatalog {
    /// Load a catalog from `path`.
    ///
    /// A missing, unreadable, or malformed catalog file is not an error:
    /// it is logged once and the returned catalog answers every lookup
    /// from the naming-convention heuristic.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "No readable catalog at {}: {e}; deriving intervals from table names",
                    path.display()
                );
                return Self { entries: None };
            }
        };

        match serde_json::from_str(&text) {
            Ok(entries) => Self {
                entries: Some(entries),
            },
            Err(e) => {
                warn!(
                    "Malformed catalog at {}: {e}; deriving intervals from table names",
                    path.display()
                );
                Self { entries: None }
            }
        }
    }

    /// A catalog with no backing file; every lookup uses the heuristic.
    pub fn without_file() -> Self {
        Self { entries: None }
    }

    /// The nominal seconds between samples for `table_name` (no directory,
    /// no extension).
    ///
    /// Either the catalog entry's `interval_seconds`, or the value derived
    /// from the table name. Pure given the catalog's contents.
    pub fn interval_seconds(&self, table_name: &str) -> u32 {
        self.entries
            .as_ref()
            .and_then(|entries| entries.get(table_name))
            .and_then(|entry| entry.interval_seconds)
            .unwrap_or_else(|| Self::interval_from_table_name(table_name))
    }

    /// Derive an interval from the table naming convention.
    ///
    /// Suffixes are checked in a fixed priority order; names with no
    /// recognized suffix default to twenty seconds, except `space*`
    /// tables which sample every five minutes.
    pub fn interval_from_table_name(table_name: &str) -> u32 {
        SUFFIX_INTERVALS
            .iter()
            .find(|(suffix, _)| table_name.ends_with(suffix))
            .map(|&(_, interval)| interval)
            .unwrap_or(if table_name.starts_with("space") {
                FIVE_MINUTES_IN_SECS
            } else {
                TWENTY_SECONDS
            })
    }
}
