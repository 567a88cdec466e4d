//! geodelta core: versioned geospatial snapshots, their diffs and change sets
//!
//! This crate holds the in-memory kernel:
//! - An entity model (points, nodes, edges, lines, areas, relations) and the
//!   read-only [`Atlas`] snapshot interface with an in-memory implementation
//! - The diff engine, which compares two snapshots into an ordered set of
//!   typed, reasoned differences, with text and GeoJSON projections
//! - Fuzzy edge matching, so renumbered or resectioned edges are not reported
//!   as topology changes
//! - Change sets and the applier that materializes a new snapshot from a
//!   base snapshot plus a change set
//!
//! Everything here is synchronous and free of I/O beyond JSON (de)serialization
//! of snapshot and change-set documents.

pub mod apply;
pub mod atlas;
pub mod changeset;
pub mod config;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod matcher;
pub mod model;

#[doc(hidden)]
pub use geodelta_core_types::schema;

pub use apply::{apply_changes, ApplyReport, ChangeApplier};
pub use atlas::{Atlas, MemoryAtlas, MemoryAtlasBuilder};
pub use changeset::{ChangeAction, ChangeItem, ChangeSetStore};
pub use config::DiffOptions;
pub use diff::{Diff, DiffEngine, DiffReason, DiffType};
pub use errors::{GdError, GdErrorKind, GeoDeltaError, Result};
pub use matcher::{EdgeMatcher, PolyLineMatcher};
pub use model::{Entity, EntityReference, ItemType};
