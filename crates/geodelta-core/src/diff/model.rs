//! Diff record types.

use crate::atlas::Atlas;
use crate::model::{Entity, EntityReference, ItemType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Kind of difference. Declaration order is the primary sort key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffType {
    Added,
    Changed,
    Removed,
}

impl DiffType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffType::Added => "ADDED",
            DiffType::Changed => "CHANGED",
            DiffType::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for DiffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an entity was reported
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffReason {
    Added,
    Removed,
    Tags,
    GeometryOrTopology,
    RelationMember,
    RelationTopology,
}

impl DiffReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffReason::Added => "ADDED",
            DiffReason::Removed => "REMOVED",
            DiffReason::Tags => "TAGS",
            DiffReason::GeometryOrTopology => "GEOMETRY_OR_TOPOLOGY",
            DiffReason::RelationMember => "RELATION_MEMBER",
            DiffReason::RelationTopology => "RELATION_TOPOLOGY",
        }
    }
}

impl fmt::Display for DiffReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One difference between the before and after snapshot.
///
/// Holds the two snapshots by reference and looks the entity up on demand,
/// so a `Diff` never owns a copy of entity data. Equality and ordering use
/// `(diff_type, item_type, identifier)` only.
#[derive(Clone, Copy)]
pub struct Diff<'a> {
    before: &'a dyn Atlas,
    after: &'a dyn Atlas,
    item_type: ItemType,
    identifier: i64,
    diff_type: DiffType,
    diff_reason: DiffReason,
}

impl<'a> Diff<'a> {
    pub fn new(
        before: &'a dyn Atlas,
        after: &'a dyn Atlas,
        item_type: ItemType,
        identifier: i64,
        diff_type: DiffType,
        diff_reason: DiffReason,
    ) -> Self {
        Self {
            before,
            after,
            item_type,
            identifier,
            diff_type,
            diff_reason,
        }
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn identifier(&self) -> i64 {
        self.identifier
    }

    pub fn reference(&self) -> EntityReference {
        EntityReference::new(self.item_type, self.identifier)
    }

    pub fn diff_type(&self) -> DiffType {
        self.diff_type
    }

    pub fn diff_reason(&self) -> DiffReason {
        self.diff_reason
    }

    pub fn before_atlas(&self) -> &'a dyn Atlas {
        self.before
    }

    pub fn after_atlas(&self) -> &'a dyn Atlas {
        self.after
    }

    /// Entity in the before snapshot; absent for `Added`
    pub fn before_entity(&self) -> Option<Entity<'a>> {
        self.before.entity(self.item_type, self.identifier)
    }

    /// Entity in the after snapshot; absent for `Removed`
    pub fn after_entity(&self) -> Option<Entity<'a>> {
        self.after.entity(self.item_type, self.identifier)
    }

    fn sort_key(&self) -> (DiffType, ItemType, i64) {
        (self.diff_type, self.item_type, self.identifier)
    }
}

impl PartialEq for Diff<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for Diff<'_> {}

impl PartialOrd for Diff<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Diff<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Debug for Diff<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diff")
            .field("diff_type", &self.diff_type)
            .field("item_type", &self.item_type)
            .field("identifier", &self.identifier)
            .field("diff_reason", &self.diff_reason)
            .field("before", &self.before.name())
            .field("after", &self.after.name())
            .finish()
    }
}

impl fmt::Display for Diff<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.diff_type, self.item_type, self.identifier, self.diff_reason
        )
    }
}

/// Serializable summary of one diff, for reports that outlive the snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummaryEntry {
    pub diff_type: DiffType,
    pub item_type: ItemType,
    pub identifier: i64,
    pub diff_reason: DiffReason,
}

impl From<&Diff<'_>> for DiffSummaryEntry {
    fn from(diff: &Diff<'_>) -> Self {
        Self {
            diff_type: diff.diff_type,
            item_type: diff.item_type,
            identifier: diff.identifier,
            diff_reason: diff.diff_reason,
        }
    }
}
