//! Snapshot delta computation.
//!
//! Compares a before and an after snapshot and produces an ordered set of
//! [`Diff`] records, plus text and GeoJSON projections of that set.
//!
//! ## Entry point
//!
//! ```ignore
//! use geodelta_core::diff::{generate, render_human_summary};
//!
//! let diffs = generate(&before, &after, DiffOptions::default())?;
//! let summary = render_human_summary(&diffs);
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: the set is ordered by (diff type, item type,
//!   identifier), so identical inputs render byte-identical output.
//! - **Fail-fast**: one pair that cannot be compared aborts the run.
//! - **Resectioning tolerance** (opt-in): edges that were only split or
//!   merged are not reported when geometry matching is enabled.

pub mod engine;
pub mod geojson;
pub mod human_summary;
pub mod model;

pub use engine::{generate, DiffEngine};
pub use geojson::{relations_to_geojson, to_geojson};
pub use human_summary::render_human_summary;
pub use model::{Diff, DiffReason, DiffSummaryEntry, DiffType};
