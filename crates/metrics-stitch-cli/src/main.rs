//! Command-line stitcher for archived metrics table captures.
//!
//! Scans one or more unpacked archive directories for timestamped CSV
//! captures, rehydrates run-length-compressed rows, and stitches each
//! logical table's captures into a single deduplicated file under the
//! output directory. Tables that fail are reported and skipped; the
//! process exits non-zero if any table could not be written.

mod error;

use std::{
    io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use metrics_stitch_core::{catalog::IntervalCatalog, stitch};
use snafu::{ensure, ResultExt};

use crate::error::{
    CliResult, CreateOutputDirSnafu, CurrentDirSnafu, InspectOutputDirSnafu,
    OutputDirNotEmptySnafu, StitchSnafu,
};

#[derive(Debug, Parser)]
#[command(
    name = "mstitch",
    version,
    about = "Rehydrate and stitch metrics table captures into one table per logical name"
)]
struct Cli {
    /// Directories to scan recursively for capture csv files
    /// (default: the current directory)
    #[arg(short = 'i', long = "input-dir", num_args = 1..)]
    input_dir: Vec<PathBuf>,

    /// Directory to create for the stitched output tables
    #[arg(long, default_value = "processed-metrics")]
    output_dir: PathBuf,

    /// Archive catalog with per-table sample intervals
    #[arg(long, default_value = "archive_properties_catalog.json")]
    catalog: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(summary) if summary.failures.is_empty() => ExitCode::SUCCESS,
        Ok(summary) => {
            eprintln!("{} table(s) failed to stitch", summary.failures.len());
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("{}", snafu::Report::from_error(err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<stitch::StitchSummary> {
    println!(
        "mstitch version {}\nWriting results to output directory {}",
        env!("CARGO_PKG_VERSION"),
        cli.output_dir.display()
    );

    // Fail before any table is touched if the destination is not fresh.
    prepare_output_dir(&cli.output_dir)?;

    let roots = if cli.input_dir.is_empty() {
        vec![std::env::current_dir().context(CurrentDirSnafu)?]
    } else {
        cli.input_dir
    };

    let catalog = IntervalCatalog::load(&cli.catalog);
    let summary = stitch::stitch_all(&roots, &cli.output_dir, &catalog).context(StitchSnafu)?;

    for failure in &summary.failures {
        eprintln!("Table {} failed: {}", failure.table, failure.error);
    }
    println!(
        "Processed and wrote {} tables to directory \"{}\"",
        summary.tables_written,
        cli.output_dir.display()
    );

    Ok(summary)
}

/// Create the output directory, accepting a pre-existing one only if it is
/// empty.
fn prepare_output_dir(path: &Path) -> CliResult<()> {
    match std::fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let mut entries = std::fs::read_dir(path).context(InspectOutputDirSnafu { path })?;
            ensure!(entries.next().is_none(), OutputDirNotEmptySnafu { path });
            Ok(())
        }
        Err(e) => Err(e).context(CreateOutputDirSnafu { path }),
    }
}
