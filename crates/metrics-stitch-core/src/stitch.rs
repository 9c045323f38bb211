//! Merging a logical table's captures into one canonical output file.
//!
//! Stitching establishes a total order across independently captured,
//! potentially overlapping record streams. Captures are processed in
//! discovery order, never re-sorted by start time; only rows *within* one
//! capture are sorted (by parsed timestamp, stable, original file order
//! breaking ties). Every row is drained through the rehydrator, and a row
//! is committed to the output only when its timestamp is strictly greater
//! than the table's high watermark, which advances with each accepted row.
//! That strict comparison is what deduplicates overlapping capture
//! windows: the first capture establishes the baseline against a null
//! watermark, and later captures contribute only what lies beyond it.
//!
//! Tables are independent of one another: each owns its watermark, output
//! file handle, and capture list, so a per-table failure never corrupts a
//! neighbor. Output handles are closed on every exit path.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::error;
use snafu::{prelude::*, Backtrace};

use crate::{
    capture::{CaptureError, ReservedColumns},
    catalog::IntervalCatalog,
    discover::{self, DiscoverError, LogicalTable},
    rehydrate::Rehydrator,
    timefmt::{self, ParseTimestampError},
};

/// General result type for stitching operations.
pub type StitchResult<T> = Result<T, StitchError>;

/// Errors that abort stitching of a table (or, for discovery failures,
/// of the whole run).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StitchError {
    /// Reading a capture or locating its reserved columns failed.
    #[snafu(context(false), display("{source}"))]
    Capture {
        /// The capture-level error.
        source: CaptureError,
    },

    /// Scanning the input roots failed.
    #[snafu(context(false), display("{source}"))]
    Discover {
        /// The discovery-level error.
        source: DiscoverError,
    },

    /// A row's timestamp literal failed to parse. Rows that cannot be
    /// dated cannot be ordered, so this is fatal for the table.
    #[snafu(display("Cannot order rows of {path}: {source}"))]
    MalformedTimestamp {
        /// The capture file holding the offending row.
        path: String,
        /// The parse failure, including the literal.
        source: ParseTimestampError,
    },

    /// The table's output file could not be created.
    #[snafu(display("Unable to create output file {path}: {source}"))]
    CreateOutput {
        /// The output path that could not be created.
        path: String,
        /// Underlying I/O error.
        source: csv::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Writing to the table's output file failed.
    #[snafu(display("Unable to write output file {path}: {source}"))]
    WriteOutput {
        /// The output path being written.
        path: String,
        /// Underlying I/O error.
        source: csv::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}

/// One table that could not be stitched, with the error that stopped it.
#[derive(Debug)]
pub struct TableFailure {
    /// The logical table's name.
    pub table: String,
    /// What went wrong.
    pub error: StitchError,
}

/// Outcome of a whole-archive stitching run.
#[derive(Debug, Default)]
pub struct StitchSummary {
    /// Tables written successfully.
    pub tables_written: usize,
    /// Total data rows committed across all tables.
    pub rows_written: u64,
    /// Tables that failed, in processing order.
    pub failures: Vec<TableFailure>,
}

/// Stitch one logical table into `<output_dir>/<name>.csv`.
///
/// The header row is written exactly once, taken from the first non-empty
/// capture. Returns the number of data rows committed.
///
/// # Errors
///
/// Fatal conditions for the table: an unreadable capture, a capture with
/// rows but no timestamp column, a timestamp literal that fails to parse,
/// or an output I/O failure. The partially written output file, if any, is
/// closed before this returns.
pub fn stitch_table(table: &LogicalTable, output_dir: &Path) -> StitchResult<u64> {
    let out_path = output_dir.join(format!("{}.csv", table.name));
    let out_display = out_path.display().to_string();

    let mut writer = csv::WriterBuilder::new()
        .from_path(&out_path)
        .context(CreateOutputSnafu {
            path: out_display.clone(),
        })?;

    let mut watermark: Option<NaiveDateTime> = None;
    let mut header_written = false;
    let mut rows_written: u64 = 0;

    for capture in &table.captures {
        let mut rows = capture.all_rows()?;
        if rows.len() < 2 {
            // Header-only or empty capture; contributes nothing.
            continue;
        }
        let header = rows.remove(0);
        let reserved = ReservedColumns::locate(&header, capture.path())?;
        let rehydrator = Rehydrator::new(reserved, capture.interval_seconds());

        // Key each row by parsed timestamp, keeping its 1-based file line
        // for stable tie-breaks and for rehydration warnings.
        let mut keyed = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let ts = timefmt::parse_timestamp(&row[reserved.timestamp]).context(
                MalformedTimestampSnafu {
                    path: capture.path().display().to_string(),
                },
            )?;
            keyed.push((ts, index as u64 + 2, row));
        }
        keyed.sort_by_key(|&(ts, line, _)| (ts, line));

        if !header_written {
            writer.write_record(&header).context(WriteOutputSnafu {
                path: out_display.clone(),
            })?;
            header_written = true;
        }

        for (ts, line, row) in keyed {
            for (out_ts, out_row) in rehydrator.expand(row, ts, capture.path(), line) {
                if watermark.map_or(true, |w| out_ts > w) {
                    writer.write_record(&out_row).context(WriteOutputSnafu {
                        path: out_display.clone(),
                    })?;
                    watermark = Some(out_ts);
                    rows_written += 1;
                }
            }
        }
    }

    writer
        .flush()
        .map_err(csv::Error::from)
        .context(WriteOutputSnafu { path: out_display })?;
    Ok(rows_written)
}

/// Discover every logical table under `roots` and stitch each one into
/// `output_dir`.
///
/// A fatal error on one table is logged and recorded in the summary, and
/// processing continues with the remaining tables. `output_dir` must
/// already exist; creating it (and enforcing the emptiness precondition)
/// is the caller's concern.
///
/// # Errors
///
/// Only discovery failures abort the whole run: an untraversable input
/// root, or an unreadable candidate file while the capture set is built.
pub fn stitch_all(
    roots: &[PathBuf],
    output_dir: &Path,
    catalog: &IntervalCatalog,
) -> StitchResult<StitchSummary> {
    let tables = discover::logical_tables(roots, catalog)?;

    let mut summary = StitchSummary::default();
    for table in tables {
        match stitch_table(&table, output_dir) {
            Ok(rows) => {
                summary.tables_written += 1;
                summary.rows_written += rows;
            }
            Err(err) => {
                error!("Failed to stitch table {}: {err}", table.name);
                summary.failures.push(TableFailure {
                    table: table.name,
                    error: err,
                });
            }
        }
    }

    Ok(summary)
}
