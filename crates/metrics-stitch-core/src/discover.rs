//! Locating capture files and grouping them into logical tables.
//!
//! An archive's input roots are scanned recursively; a file qualifies as a
//! capture iff it has a `.csv` extension (case-insensitive), a header row
//! containing a `timestamp` column, and at least one data row. Anything
//! else (configuration tables, snapshots, empty files) is silently left to
//! the enrichment stage.
//!
//! Qualifying files are grouped by base filename, directory independent,
//! so each group holds one logical table's captures across every
//! collection subdirectory. Files are sorted by full path before grouping,
//! which makes capture order deterministic across filesystems.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use snafu::{prelude::*, Backtrace};
use walkdir::WalkDir;

use crate::{
    capture::{self, CaptureError, CaptureReader},
    catalog::IntervalCatalog,
};

/// General result type for discovery operations.
pub type DiscoverResult<T> = Result<T, DiscoverError>;

/// Errors raised while scanning input roots for capture files.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DiscoverError {
    /// An input directory could not be traversed.
    #[snafu(display("Failed to walk input directory {path}: {source}"))]
    Walk {
        /// The root whose traversal failed.
        path: String,
        /// Underlying traversal error.
        source: walkdir::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// A candidate file could not be probed or read. Surfaced as a hard
    /// failure rather than a silent skip, since it indicates unexpected
    /// corruption of the archive.
    #[snafu(context(false), display("{source}"))]
    Probe {
        /// The capture-level error.
        source: CaptureError,
    },
}

/// One logical table: the conceptual time series spanning every collection
/// that captured it.
#[derive(Debug)]
pub struct LogicalTable {
    /// The table name: base filename with the extension stripped.
    pub name: String,
    /// The table's non-empty captures, in discovery (path) order.
    pub captures: Vec<CaptureReader>,
}

/// Scan `roots` recursively and return every qualifying capture file,
/// sorted by full path.
pub fn timestamped_capture_files(roots: &[PathBuf]) -> DiscoverResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for root in roots {
        for entry in WalkDir::new(root) {
            let entry = entry.context(WalkSnafu {
                path: root.display().to_string(),
            })?;
            if !entry.file_type().is_file() || !has_csv_extension(entry.path()) {
                continue;
            }
            if capture::has_timestamped_data(entry.path())? {
                files.push(entry.path().to_path_buf());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Group capture files into logical-table buckets by base filename.
///
/// The returned map iterates in table-name order; within a bucket the
/// paths keep their discovery order.
pub fn group_by_table(files: &[PathBuf]) -> BTreeMap<String, Vec<PathBuf>> {
    let mut tables: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for path in files {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        tables.entry(stem.to_string()).or_default().push(path.clone());
    }

    tables
}

/// Discover, group, and wrap every logical table under `roots`.
///
/// Each table's sample interval is resolved through `catalog` once and
/// shared by all of its captures. Captures that turn out to have no data
/// row are dropped; a table whose captures are all empty is omitted.
pub fn logical_tables(
    roots: &[PathBuf],
    catalog: &IntervalCatalog,
) -> DiscoverResult<Vec<LogicalTable>> {
    let files = timestamped_capture_files(roots)?;

    let mut tables = Vec::new();
    for (name, paths) in group_by_table(&files) {
        let interval = catalog.interval_seconds(&name);

        let mut captures = Vec::with_capacity(paths.len());
        for path in paths {
            let reader = CaptureReader::new(path, interval);
            if reader.has_data()? {
                captures.push(reader);
            }
        }

        if !captures.is_empty() {
            tables.push(LogicalTable { name, captures });
        }
    }

    Ok(tables)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
}
