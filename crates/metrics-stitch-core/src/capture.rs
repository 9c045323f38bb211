//! Reading one physical capture file.
//!
//! A capture is one collection's slice of a logical table: a CSV file whose
//! first row is the column header. The engine only interprets three
//! reserved columns, matched case-insensitively against the header:
//!
//! - `timestamp` — mandatory for any capture this engine processes; the
//!   order key for stitching.
//! - `repeat_count` — optional; drives rehydration of run-length
//!   compressed rows.
//! - `deleted` — optional; rows with a non-empty value are tombstones.
//!
//! Captures of the same logical table are not required to share column
//! ordering, only presence of the reserved names, so the indices are
//! located once per capture against its own header.

use std::path::{Path, PathBuf};

use snafu::{prelude::*, Backtrace};

/// One sample: an ordered list of field values, width equal to the
/// capture's header width. Values stay as strings; typing is the concern
/// of downstream enrichment, not of stitching.
pub type Row = Vec<String>;

/// Reserved column name for the order key.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// Reserved column name for the run-length repeat count.
pub const REPEAT_COUNT_COLUMN: &str = "repeat_count";
/// Reserved column name for the tombstone flag.
pub const DELETED_COLUMN: &str = "deleted";

/// General result type for capture file operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors raised while reading a capture file or locating its reserved
/// columns.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CaptureError {
    /// The file could not be read or is not well-formed CSV.
    #[snafu(display("Unable to read capture file {path}: {source}"))]
    Read {
        /// The capture file that failed.
        path: String,
        /// Underlying CSV/I-O error.
        source: csv::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The capture has rows but its header carries no `timestamp` column,
    /// so there is no order key to stitch by.
    #[snafu(display("No timestamp column in capture file {path}"))]
    MissingTimestampColumn {
        /// The capture file whose header was rejected.
        path: String,
    },
}

/// Indices of the reserved columns within one capture's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedColumns {
    /// Index of the mandatory `timestamp` column.
    pub timestamp: usize,
    /// Index of the optional `repeat_count` column. Absence disables
    /// rehydration for the capture.
    pub repeat_count: Option<usize>,
    /// Index of the optional `deleted` column. Absence disables tombstone
    /// filtering for the capture.
    pub deleted: Option<usize>,
}

impl ReservedColumns {
    /// Locate the reserved columns in `header`, case-insensitively.
    ///
    /// # Errors
    ///
    /// [`CaptureError::MissingTimestampColumn`] when `timestamp` is absent;
    /// the other two columns are optional.
    pub fn locate(header: &[String], path: &Path) -> CaptureResult<Self> {
        let timestamp = find_column(header, TIMESTAMP_COLUMN).context(MissingTimestampColumnSnafu {
            path: path.display().to_string(),
        })?;

        Ok(Self {
            timestamp,
            repeat_count: find_column(header, REPEAT_COUNT_COLUMN),
            deleted: find_column(header, DELETED_COLUMN),
        })
    }
}

/// Find a column by name in a header row, ignoring ASCII case.
pub fn find_column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.eq_ignore_ascii_case(name))
}

/// Wraps one physical capture file for one logical table.
///
/// Construction is cheap; nothing is read until one of the accessors is
/// called. This is a batch reader, not a streaming one: stitching needs a
/// per-capture sort before the merge, so [`CaptureReader::all_rows`]
/// materializes the whole file.
#[derive(Debug)]
pub struct CaptureReader {
    path: PathBuf,
    interval_seconds: u32,
}

impl CaptureReader {
    /// Create a reader for `path` with the table's resolved sample
    /// interval.
    pub fn new(path: impl Into<PathBuf>, interval_seconds: u32) -> Self {
        Self {
            path: path.into(),
            interval_seconds,
        }
    }

    /// The capture file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The nominal seconds between samples, used when rehydrating.
    pub fn interval_seconds(&self) -> u32 {
        self.interval_seconds
    }

    /// The capture's ordered column names, or an empty vector when the
    /// file has no rows at all.
    pub fn headers(&self) -> CaptureResult<Vec<String>> {
        Ok(self.first_rows(1)?.pop().unwrap_or_default())
    }

    /// Whether the capture has a header row and at least one data row.
    pub fn has_data(&self) -> CaptureResult<bool> {
        Ok(self.first_rows(2)?.len() == 2)
    }

    /// Every row of the capture in file order, header first.
    pub fn all_rows(&self) -> CaptureResult<Vec<Row>> {
        let mut reader = self.open()?;
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context(ReadSnafu {
                path: self.path.display().to_string(),
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }

    fn first_rows(&self, limit: usize) -> CaptureResult<Vec<Row>> {
        let mut reader = self.open()?;
        let mut rows = Vec::with_capacity(limit);
        for record in reader.records().take(limit) {
            let record = record.context(ReadSnafu {
                path: self.path.display().to_string(),
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }

    fn open(&self) -> CaptureResult<csv::Reader<std::fs::File>> {
        // The header row is not treated specially by the CSV layer; it is
        // just the first record. Record widths are still validated against
        // it, so a ragged capture surfaces as a Read error.
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .context(ReadSnafu {
                path: self.path.display().to_string(),
            })
    }
}

/// Whether `path` holds a capture this engine can stitch: a header row
/// containing a `timestamp` column (case-insensitive) and at least one data
/// row. Configuration/snapshot tables fail this probe and are left to the
/// enrichment stage.
///
/// # Errors
///
/// An unreadable file is a hard failure, not a silent exclusion; it
/// indicates unexpected corruption of the archive.
pub fn has_timestamped_data(path: &Path) -> CaptureResult<bool> {
    let reader = CaptureReader::new(path, 0);
    let rows = reader.first_rows(2)?;
    match rows.as_slice() {
        [header, _data, ..] => Ok(find_column(header, TIMESTAMP_COLUMN).is_some()),
        _ => Ok(false),
    }
}
