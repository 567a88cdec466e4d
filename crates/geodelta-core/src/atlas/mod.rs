//! Immutable snapshot interface and its in-memory implementation.
//!
//! The diff engine and the change applier only talk to snapshots through
//! [`Atlas`]. [`MemoryAtlas`] is the implementation shipped here; it is
//! produced by [`MemoryAtlasBuilder`] and can be loaded from or written to a
//! [`SnapshotDocument`].

pub mod builder;
pub mod document;
pub mod memory;

pub use builder::MemoryAtlasBuilder;
pub use document::{EdgeRecord, SnapshotDocument};
pub use memory::MemoryAtlas;

use crate::model::{
    Area, Edge, Entity, EntityReference, ItemType, Line, Node, Point, Rectangle, Relation,
};

/// Read-only view of one snapshot.
///
/// Iteration methods return identifiers and entities in ascending identifier
/// order. Implementations must be immutable once built, which is what makes
/// them shareable across diff workers.
pub trait Atlas: Send + Sync {
    /// Human-readable name used in logs and rendered output
    fn name(&self) -> &str;

    fn point(&self, identifier: i64) -> Option<&Point>;
    fn node(&self, identifier: i64) -> Option<&Node>;
    fn edge(&self, identifier: i64) -> Option<&Edge>;
    fn line(&self, identifier: i64) -> Option<&Line>;
    fn area(&self, identifier: i64) -> Option<&Area>;
    fn relation(&self, identifier: i64) -> Option<&Relation>;

    /// All identifiers of `item_type`, ascending
    fn identifiers(&self, item_type: ItemType) -> Vec<i64>;

    /// Edges whose end node is `node`, ascending by identifier
    fn in_edges(&self, node: i64) -> Vec<&Edge>;

    /// Edges whose start node is `node`, ascending by identifier
    fn out_edges(&self, node: i64) -> Vec<&Edge>;

    /// Relations listing `reference` as a member, ascending by identifier
    fn relations_with_member(&self, reference: EntityReference) -> Vec<&Relation>;

    /// Edges whose bounds intersect `bounds`, ascending by identifier
    fn edges_intersecting(&self, bounds: &Rectangle) -> Vec<&Edge>;

    fn entity(&self, item_type: ItemType, identifier: i64) -> Option<Entity<'_>> {
        match item_type {
            ItemType::Point => self.point(identifier).map(Entity::Point),
            ItemType::Node => self.node(identifier).map(Entity::Node),
            ItemType::Edge => self.edge(identifier).map(Entity::Edge),
            ItemType::Line => self.line(identifier).map(Entity::Line),
            ItemType::Area => self.area(identifier).map(Entity::Area),
            ItemType::Relation => self.relation(identifier).map(Entity::Relation),
        }
    }

    fn entities(&self, item_type: ItemType) -> Vec<Entity<'_>> {
        self.identifiers(item_type)
            .into_iter()
            .filter_map(|id| self.entity(item_type, id))
            .collect()
    }

    fn contains(&self, item_type: ItemType, identifier: i64) -> bool {
        self.entity(item_type, identifier).is_some()
    }

    /// The declared reverse of `edge`, if present
    fn reverse_edge(&self, edge: &Edge) -> Option<&Edge> {
        self.edge(edge.reverse_identifier())
    }

    fn len(&self, item_type: ItemType) -> usize {
        self.identifiers(item_type).len()
    }

    fn is_empty(&self) -> bool {
        ItemType::ALL.iter().all(|t| self.len(*t) == 0)
    }
}
