use crate::atlas::{Atlas, SnapshotDocument};
use crate::model::{
    Area, Edge, EntityReference, ItemType, Line, Node, Point, Rectangle, Relation,
};
use sha2::{Digest as _, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// BTreeMap-backed immutable snapshot.
///
/// Adjacency and parent-relation indexes are computed once by the builder.
#[derive(Debug, Clone)]
pub struct MemoryAtlas {
    pub(crate) name: String,
    pub(crate) points: BTreeMap<i64, Point>,
    pub(crate) nodes: BTreeMap<i64, Node>,
    pub(crate) edges: BTreeMap<i64, Edge>,
    pub(crate) lines: BTreeMap<i64, Line>,
    pub(crate) areas: BTreeMap<i64, Area>,
    pub(crate) relations: BTreeMap<i64, Relation>,
    pub(crate) in_edges: BTreeMap<i64, BTreeSet<i64>>,
    pub(crate) out_edges: BTreeMap<i64, BTreeSet<i64>>,
    pub(crate) parents: BTreeMap<EntityReference, BTreeSet<i64>>,
}

impl MemoryAtlas {
    /// Snapshot with no entities
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: BTreeMap::new(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            lines: BTreeMap::new(),
            areas: BTreeMap::new(),
            relations: BTreeMap::new(),
            in_edges: BTreeMap::new(),
            out_edges: BTreeMap::new(),
            parents: BTreeMap::new(),
        }
    }

    /// Content digest (SHA-256 hex) over every entity, ignoring the name.
    ///
    /// Two snapshots with the same entities, tags and geometries have the
    /// same digest regardless of how they were built.
    pub fn digest(&self) -> String {
        let mut document = self.to_document();
        document.name = String::new();
        // Serializing plain data structs with string keys cannot fail.
        let canonical = serde_json::to_vec(&document).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        hex::encode(hasher.finalize())
    }

    pub fn to_document(&self) -> SnapshotDocument {
        SnapshotDocument::from_atlas(self)
    }

    fn edges_by_id<'a>(&'a self, ids: Option<&BTreeSet<i64>>) -> Vec<&'a Edge> {
        ids.map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }
}

impl Atlas for MemoryAtlas {
    fn name(&self) -> &str {
        &self.name
    }

    fn point(&self, identifier: i64) -> Option<&Point> {
        self.points.get(&identifier)
    }

    fn node(&self, identifier: i64) -> Option<&Node> {
        self.nodes.get(&identifier)
    }

    fn edge(&self, identifier: i64) -> Option<&Edge> {
        self.edges.get(&identifier)
    }

    fn line(&self, identifier: i64) -> Option<&Line> {
        self.lines.get(&identifier)
    }

    fn area(&self, identifier: i64) -> Option<&Area> {
        self.areas.get(&identifier)
    }

    fn relation(&self, identifier: i64) -> Option<&Relation> {
        self.relations.get(&identifier)
    }

    fn identifiers(&self, item_type: ItemType) -> Vec<i64> {
        match item_type {
            ItemType::Point => self.points.keys().copied().collect(),
            ItemType::Node => self.nodes.keys().copied().collect(),
            ItemType::Edge => self.edges.keys().copied().collect(),
            ItemType::Line => self.lines.keys().copied().collect(),
            ItemType::Area => self.areas.keys().copied().collect(),
            ItemType::Relation => self.relations.keys().copied().collect(),
        }
    }

    fn in_edges(&self, node: i64) -> Vec<&Edge> {
        self.edges_by_id(self.in_edges.get(&node))
    }

    fn out_edges(&self, node: i64) -> Vec<&Edge> {
        self.edges_by_id(self.out_edges.get(&node))
    }

    fn relations_with_member(&self, reference: EntityReference) -> Vec<&Relation> {
        self.parents
            .get(&reference)
            .map(|ids| ids.iter().filter_map(|id| self.relations.get(id)).collect())
            .unwrap_or_default()
    }

    fn edges_intersecting(&self, bounds: &Rectangle) -> Vec<&Edge> {
        self.edges
            .values()
            .filter(|edge| {
                edge.polyline
                    .bounds()
                    .map(|b| b.intersects(bounds))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn len(&self, item_type: ItemType) -> usize {
        match item_type {
            ItemType::Point => self.points.len(),
            ItemType::Node => self.nodes.len(),
            ItemType::Edge => self.edges.len(),
            ItemType::Line => self.lines.len(),
            ItemType::Area => self.areas.len(),
            ItemType::Relation => self.relations.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::MemoryAtlasBuilder;
    use crate::model::{Location, PolyLine, RelationMember, Tags};

    fn two_edge_atlas() -> MemoryAtlas {
        let mut b = MemoryAtlasBuilder::new("t");
        b.add_node(1, Location::new(0, 0), Tags::new()).unwrap();
        b.add_node(2, Location::new(0, 10), Tags::new()).unwrap();
        b.add_node(3, Location::new(0, 20), Tags::new()).unwrap();
        b.add_edge(
            10,
            PolyLine::new(vec![Location::new(0, 0), Location::new(0, 10)]),
            Tags::new(),
        )
        .unwrap();
        b.add_edge(
            11,
            PolyLine::new(vec![Location::new(0, 10), Location::new(0, 20)]),
            Tags::new(),
        )
        .unwrap();
        b.add_relation(
            50,
            vec![RelationMember::new(ItemType::Edge, 11, "")],
            Tags::new(),
        )
        .unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_adjacency_indexes() {
        let atlas = two_edge_atlas();
        let ins: Vec<i64> = atlas.in_edges(2).iter().map(|e| e.identifier).collect();
        let outs: Vec<i64> = atlas.out_edges(2).iter().map(|e| e.identifier).collect();
        assert_eq!(ins, vec![10]);
        assert_eq!(outs, vec![11]);
    }

    #[test]
    fn test_parent_relation_index() {
        let atlas = two_edge_atlas();
        let parents = atlas.relations_with_member(EntityReference::new(ItemType::Edge, 11));
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].identifier, 50);
        assert!(atlas
            .relations_with_member(EntityReference::new(ItemType::Edge, 10))
            .is_empty());
    }

    #[test]
    fn test_edges_intersecting_uses_bounds() {
        let atlas = two_edge_atlas();
        let query = Location::new(0, 15).bounds();
        let hits: Vec<i64> = atlas
            .edges_intersecting(&query)
            .iter()
            .map(|e| e.identifier)
            .collect();
        assert_eq!(hits, vec![11]);
    }

    #[test]
    fn test_digest_ignores_name() {
        let a = two_edge_atlas();
        let mut b = a.clone();
        b.name = "other".to_string();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), MemoryAtlas::empty("t").digest());
    }
}
