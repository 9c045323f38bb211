//! Shared fixtures for CLI integration tests: tiny archive trees with
//! collection subdirectories and capture files.

use std::path::{Path, PathBuf};

/// Write a capture file at `root/rel`, creating parent directories.
pub fn write_capture(root: &Path, rel: &str, lines: &[&str]) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, format!("{}\n", lines.join("\n"))).unwrap();
    path
}

/// Read an output table back as its raw lines.
pub fn output_lines(output_dir: &Path, table: &str) -> Vec<String> {
    let contents = std::fs::read_to_string(output_dir.join(format!("{table}.csv"))).unwrap();
    contents.lines().map(str::to_string).collect()
}
