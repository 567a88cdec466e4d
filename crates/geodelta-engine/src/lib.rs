//! geodelta engine: orchestration layer
//!
//! Drives the core over files: diffs directories of snapshot shards on a
//! bounded worker pool and writes the text and GeoJSON projections, and
//! applies change-set documents to snapshot documents.

pub mod apply;
pub mod batch;

pub use apply::{apply_change_set, ApplySummary};
pub use batch::{diff_directories, diff_shards, BatchConfig, BatchReport, ShardOutcome};
