//! Core engine for stitching archived metrics table captures.
//!
//! An unpacked metrics archive holds one subdirectory per monitoring
//! collection, each containing CSV captures named `<table_name>.csv`. A
//! capture is one collection's time slice of a logical table, and may have
//! been space-compressed at source with a run-length scheme (a
//! `repeat_count` column plus a `deleted` flag). This crate provides the
//! pieces that turn those overlapping slices into exactly one canonical
//! table per logical name:
//!
//! - Timestamp literal parsing and synthesis (`timefmt` module).
//! - Per-table sample-interval resolution from an optional JSON catalog
//!   with a naming-convention fallback (`catalog` module).
//! - A reader over one physical capture file that locates the reserved
//!   `timestamp` / `repeat_count` / `deleted` columns (`capture` module).
//! - Rehydration of run-length-compressed rows into evenly spaced samples
//!   (`rehydrate` module).
//! - The stitcher itself, which merges a table's captures behind a
//!   monotonic high-watermark so overlapping windows deduplicate
//!   (`stitch` module).
//! - Recursive discovery of capture files and grouping into logical
//!   tables (`discover` module).
//!
//! The command-line front end (argument parsing, output-directory
//! preconditions, exit codes) lives in the companion `metrics-stitch-cli`
//! crate and is expected to depend on this crate rather than re-implement
//! any of the merge logic.
#![deny(missing_docs)]
pub mod capture;
pub mod catalog;
pub mod discover;
pub mod rehydrate;
pub mod stitch;
pub mod timefmt;
