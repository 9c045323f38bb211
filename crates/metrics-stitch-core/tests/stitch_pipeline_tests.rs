//! End-to-end tests for the discovery -> rehydration -> stitching pipeline,
//! driven through real files in temporary archive layouts.

use std::path::{Path, PathBuf};

use metrics_stitch_core::{
    capture::CaptureReader,
    catalog::IntervalCatalog,
    discover::{logical_tables, LogicalTable},
    stitch::{stitch_all, stitch_table, StitchError},
};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_capture(root: &Path, rel: &str, lines: &[&str]) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, format!("{}\n", lines.join("\n"))).unwrap();
    path
}

fn output_lines(output_dir: &Path, table: &str) -> Vec<String> {
    let contents = std::fs::read_to_string(output_dir.join(format!("{table}.csv"))).unwrap();
    contents.lines().map(str::to_string).collect()
}

fn stitch_archive(root: &Path, output_dir: &Path) -> Vec<LogicalTable> {
    let tables = logical_tables(&[root.to_path_buf()], &IntervalCatalog::without_file()).unwrap();
    std::fs::create_dir_all(output_dir).unwrap();
    tables
}

#[test]
fn single_capture_is_sorted_and_rehydrated() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    write_capture(
        tmp.path(),
        "coll_a/cpu.csv",
        &[
            "timestamp,repeat_count,value",
            "2020-01-01 00:01:00,1,late",
            "2020-01-01 00:00:00,2,early",
        ],
    );

    let tables = stitch_archive(tmp.path(), &out);
    let rows = stitch_table(&tables[0], &out)?;

    assert_eq!(rows, 3);
    assert_eq!(
        output_lines(&out, "cpu"),
        vec![
            "timestamp,repeat_count,value",
            "2020-01-01 00:00:00,1,early",
            "2020-01-01 00:00:20+00:00,1,early",
            "2020-01-01 00:01:00,1,late",
        ]
    );
    Ok(())
}

#[test]
fn fully_overlapping_capture_contributes_nothing() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    write_capture(
        tmp.path(),
        "coll_a/cpu.csv",
        &[
            "timestamp,value",
            "2020-01-01 00:00:00,1",
            "2020-01-01 00:00:20,2",
        ],
    );
    write_capture(
        tmp.path(),
        "coll_b/cpu.csv",
        &[
            "timestamp,value",
            "2020-01-01 00:00:00,9",
            "2020-01-01 00:00:20,9",
        ],
    );

    let tables = stitch_archive(tmp.path(), &out);
    stitch_table(&tables[0], &out)?;

    assert_eq!(
        output_lines(&out, "cpu"),
        vec![
            "timestamp,value",
            "2020-01-01 00:00:00,1",
            "2020-01-01 00:00:20,2",
        ]
    );
    Ok(())
}

#[test]
fn partial_overlap_keeps_only_newer_rows() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    // The spec's concrete scenario: B's first row is at or before A's last
    // committed timestamp and must be dropped.
    write_capture(
        tmp.path(),
        "coll_a/cpu.csv",
        &[
            "timestamp,v",
            "2020-01-01 00:00:00,1",
            "2020-01-01 00:00:20,2",
        ],
    );
    write_capture(
        tmp.path(),
        "coll_b/cpu.csv",
        &[
            "timestamp,v",
            "2020-01-01 00:00:00,9",
            "2020-01-01 00:00:40,3",
        ],
    );

    let tables = stitch_archive(tmp.path(), &out);
    stitch_table(&tables[0], &out)?;

    assert_eq!(
        output_lines(&out, "cpu"),
        vec![
            "timestamp,v",
            "2020-01-01 00:00:00,1",
            "2020-01-01 00:00:20,2",
            "2020-01-01 00:00:40,3",
        ]
    );
    Ok(())
}

#[test]
fn synthetic_row_equal_to_watermark_is_discarded() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    // Capture A ends at 00:00:20 via rehydration; B starts exactly there.
    write_capture(
        tmp.path(),
        "coll_a/cpu.csv",
        &["timestamp,repeat_count,v", "2020-01-01 00:00:00,2,a"],
    );
    write_capture(
        tmp.path(),
        "coll_b/cpu.csv",
        &[
            "timestamp,repeat_count,v",
            "2020-01-01 00:00:20,1,b",
            "2020-01-01 00:00:30,1,c",
        ],
    );

    let tables = stitch_archive(tmp.path(), &out);
    stitch_table(&tables[0], &out)?;

    assert_eq!(
        output_lines(&out, "cpu"),
        vec![
            "timestamp,repeat_count,v",
            "2020-01-01 00:00:00,1,a",
            "2020-01-01 00:00:20+00:00,1,a",
            "2020-01-01 00:00:30,1,c",
        ]
    );
    Ok(())
}

#[test]
fn deleted_rows_never_commit_and_never_advance_the_watermark() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    write_capture(
        tmp.path(),
        "coll_a/cpu.csv",
        &[
            "timestamp,repeat_count,deleted,v",
            "2020-01-01 00:00:00,1,,keep",
            "2020-01-01 00:00:20,5,true,drop",
            "2020-01-01 00:00:40,1,,keep2",
        ],
    );

    let tables = stitch_archive(tmp.path(), &out);
    stitch_table(&tables[0], &out)?;

    assert_eq!(
        output_lines(&out, "cpu"),
        vec![
            "timestamp,repeat_count,deleted,v",
            "2020-01-01 00:00:00,1,,keep",
            "2020-01-01 00:00:40,1,,keep2",
        ]
    );
    Ok(())
}

#[test]
fn empty_repeat_count_drops_the_row_without_aborting() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    write_capture(
        tmp.path(),
        "coll_a/cpu.csv",
        &[
            "timestamp,repeat_count,v",
            "2020-01-01 00:00:00,,bad",
            "2020-01-01 00:00:20,1,good",
        ],
    );

    let tables = stitch_archive(tmp.path(), &out);
    stitch_table(&tables[0], &out)?;

    assert_eq!(
        output_lines(&out, "cpu"),
        vec!["timestamp,repeat_count,v", "2020-01-01 00:00:20,1,good"]
    );
    Ok(())
}

#[test]
fn implausible_repeat_count_drops_the_row_without_aborting() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    write_capture(
        tmp.path(),
        "coll_a/cpu.csv",
        &[
            "timestamp,repeat_count,v",
            "2020-01-01 00:00:00,18446744073709551615,bad",
            "2020-01-01 00:00:20,1,good",
        ],
    );

    let tables = stitch_archive(tmp.path(), &out);
    stitch_table(&tables[0], &out)?;

    assert_eq!(
        output_lines(&out, "cpu"),
        vec!["timestamp,repeat_count,v", "2020-01-01 00:00:20,1,good"]
    );
    Ok(())
}

#[test]
fn header_is_written_once_from_the_first_capture() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    write_capture(
        tmp.path(),
        "coll_a/cpu.csv",
        &["timestamp,v", "2020-01-01 00:00:00,1"],
    );
    write_capture(
        tmp.path(),
        "coll_b/cpu.csv",
        &["timestamp,v", "2020-01-01 00:01:00,2"],
    );

    let tables = stitch_archive(tmp.path(), &out);
    stitch_table(&tables[0], &out)?;

    let lines = output_lines(&out, "cpu");
    assert_eq!(lines.iter().filter(|l| *l == "timestamp,v").count(), 1);
    assert_eq!(lines[0], "timestamp,v");
    Ok(())
}

#[test]
fn committed_timestamps_are_strictly_increasing() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    write_capture(
        tmp.path(),
        "coll_a/cpu_five_mins.csv",
        &[
            "timestamp,repeat_count,v",
            "2020-01-01 01:00:00,3,x",
            "2020-01-01 00:00:00,2,y",
        ],
    );
    write_capture(
        tmp.path(),
        "coll_b/cpu_five_mins.csv",
        &[
            "timestamp,repeat_count,v",
            "2020-01-01 00:55:00,1,z",
            "2020-01-01 01:20:00,2,w",
        ],
    );

    let tables = stitch_archive(tmp.path(), &out);
    stitch_table(&tables[0], &out)?;

    let lines = output_lines(&out, "cpu_five_mins");
    let stamps: Vec<String> = lines[1..]
        .iter()
        .map(|l| l.split(',').next().unwrap().replace("+00:00", ""))
        .collect();
    let mut sorted = stamps.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(stamps, sorted, "output must be strictly increasing: {lines:?}");
    Ok(())
}

#[test]
fn capture_without_timestamp_column_is_fatal_for_the_table() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    std::fs::create_dir_all(&out)?;
    let path = write_capture(tmp.path(), "coll_a/odd.csv", &["name,v", "a,1"]);

    // Discovery would exclude this file; drive the stitcher directly to
    // exercise the engine's own contract.
    let table = LogicalTable {
        name: "odd".to_string(),
        captures: vec![CaptureReader::new(path, 20)],
    };
    let err = stitch_table(&table, &out).unwrap_err();
    assert!(matches!(err, StitchError::Capture { .. }), "{err}");
    Ok(())
}

#[test]
fn malformed_timestamp_is_fatal_for_the_table() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    write_capture(
        tmp.path(),
        "coll_a/cpu.csv",
        &[
            "timestamp,v",
            "2020-01-01 00:00:00,1",
            "not-a-timestamp,2",
        ],
    );

    let tables = stitch_archive(tmp.path(), &out);
    let err = stitch_table(&tables[0], &out).unwrap_err();
    assert!(matches!(err, StitchError::MalformedTimestamp { .. }), "{err}");
    Ok(())
}

#[test]
fn stitch_all_continues_past_a_failed_table() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    std::fs::create_dir_all(&out)?;
    write_capture(
        tmp.path(),
        "coll_a/bad.csv",
        &["timestamp,v", "garbage,1"],
    );
    write_capture(
        tmp.path(),
        "coll_a/good.csv",
        &["timestamp,v", "2020-01-01 00:00:00,1"],
    );

    let summary = stitch_all(
        &[tmp.path().to_path_buf()],
        &out,
        &IntervalCatalog::without_file(),
    )?;

    assert_eq!(summary.tables_written, 1);
    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].table, "bad");
    assert_eq!(
        output_lines(&out, "good"),
        vec!["timestamp,v", "2020-01-01 00:00:00,1"]
    );
    Ok(())
}

#[test]
fn catalog_interval_drives_rehydration_spacing() -> TestResult {
    let tmp = TempDir::new()?;
    let out = tmp.path().join("out");
    std::fs::create_dir_all(&out)?;
    write_capture(
        tmp.path(),
        "coll_a/cpu.csv",
        &["timestamp,repeat_count,v", "2020-01-01 00:00:00,2,x"],
    );
    let catalog_path = tmp.path().join("archive_properties_catalog.json");
    std::fs::write(&catalog_path, r#"{"cpu": {"interval_seconds": 3600}}"#)?;

    let catalog = IntervalCatalog::load(&catalog_path);
    let tables = logical_tables(&[tmp.path().to_path_buf()], &catalog)?;
    stitch_table(&tables[0], &out)?;

    assert_eq!(
        output_lines(&out, "cpu"),
        vec![
            "timestamp,repeat_count,v",
            "2020-01-01 00:00:00,1,x",
            "2020-01-01 01:00:00+00:00,1,x",
        ]
    );
    Ok(())
}
