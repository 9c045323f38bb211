use std::path::PathBuf;

use metrics_stitch_core::stitch::StitchError;
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display(
        "Output directory {} already exists and is not empty. \
         Delete it if you need new results.",
        path.display()
    ))]
    OutputDirNotEmpty { path: PathBuf },

    #[snafu(display("Cannot create output directory {}: {source}", path.display()))]
    CreateOutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Cannot inspect output directory {}: {source}", path.display()))]
    InspectOutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Cannot determine the current directory: {source}"))]
    CurrentDir { source: std::io::Error },

    #[snafu(display("{source}"))]
    Stitch {
        #[snafu(source(from(StitchError, Box::new)))]
        source: Box<StitchError>,
    },
}
