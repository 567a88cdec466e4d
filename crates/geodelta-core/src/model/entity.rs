//! Entity types and the entity reference contract.

use crate::model::geometry::{Location, PolyLine, Polygon, Rectangle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tag map. Ordered so that rendering and hashing are deterministic.
pub type Tags = BTreeMap<String, String>;

/// The six entity kinds, in declaration order.
///
/// The derived `Ord` is part of the diff ordering contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    Point,
    Node,
    Edge,
    Line,
    Area,
    Relation,
}

impl ItemType {
    pub const ALL: [ItemType; 6] = [
        ItemType::Point,
        ItemType::Node,
        ItemType::Edge,
        ItemType::Line,
        ItemType::Area,
        ItemType::Relation,
    ];

    /// Types that carry their own geometry
    pub const SIMPLE: [ItemType; 5] = [
        ItemType::Point,
        ItemType::Node,
        ItemType::Edge,
        ItemType::Line,
        ItemType::Area,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Point => "Point",
            ItemType::Node => "Node",
            ItemType::Edge => "Edge",
            ItemType::Line => "Line",
            ItemType::Area => "Area",
            ItemType::Relation => "Relation",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an entity: identifiers are unique only within a type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityReference {
    pub item_type: ItemType,
    pub identifier: i64,
}

impl EntityReference {
    pub fn new(item_type: ItemType, identifier: i64) -> Self {
        Self {
            item_type,
            identifier,
        }
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.item_type, self.identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub identifier: i64,
    pub location: Location,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub identifier: i64,
    pub location: Location,
    #[serde(default)]
    pub tags: Tags,
}

/// Directed edge between two nodes.
///
/// `start_node` and `end_node` are derived from the polyline endpoints when
/// the snapshot is built. Edge `-n` is the reverse of edge `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub identifier: i64,
    pub polyline: PolyLine,
    pub start_node: i64,
    pub end_node: i64,
    pub tags: Tags,
}

impl Edge {
    pub fn reverse_identifier(&self) -> i64 {
        -self.identifier
    }

    /// Whether `other` is this edge's declared reverse
    pub fn is_reverse_of(&self, other: &Edge) -> bool {
        self.identifier != 0 && self.identifier == -other.identifier
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub identifier: i64,
    pub polyline: PolyLine,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub identifier: i64,
    pub polygon: Polygon,
    #[serde(default)]
    pub tags: Tags,
}

/// One slot in a relation's ordered member list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationMember {
    pub reference: EntityReference,
    pub role: String,
}

impl RelationMember {
    pub fn new(item_type: ItemType, identifier: i64, role: impl Into<String>) -> Self {
        Self {
            reference: EntityReference::new(item_type, identifier),
            role: role.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub identifier: i64,
    pub members: Vec<RelationMember>,
    #[serde(default)]
    pub tags: Tags,
}

impl Relation {
    /// Every (index, role) at which `reference` appears in the member list
    pub fn positions_of(&self, reference: EntityReference) -> Vec<(usize, &str)> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.reference == reference)
            .map(|(i, m)| (i, m.role.as_str()))
            .collect()
    }
}

/// Borrowed view over any entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity<'a> {
    Point(&'a Point),
    Node(&'a Node),
    Edge(&'a Edge),
    Line(&'a Line),
    Area(&'a Area),
    Relation(&'a Relation),
}

impl<'a> Entity<'a> {
    pub fn identifier(&self) -> i64 {
        match self {
            Entity::Point(p) => p.identifier,
            Entity::Node(n) => n.identifier,
            Entity::Edge(e) => e.identifier,
            Entity::Line(l) => l.identifier,
            Entity::Area(a) => a.identifier,
            Entity::Relation(r) => r.identifier,
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            Entity::Point(_) => ItemType::Point,
            Entity::Node(_) => ItemType::Node,
            Entity::Edge(_) => ItemType::Edge,
            Entity::Line(_) => ItemType::Line,
            Entity::Area(_) => ItemType::Area,
            Entity::Relation(_) => ItemType::Relation,
        }
    }

    pub fn reference(&self) -> EntityReference {
        EntityReference::new(self.item_type(), self.identifier())
    }

    pub fn tags(&self) -> &'a Tags {
        match self {
            Entity::Point(p) => &p.tags,
            Entity::Node(n) => &n.tags,
            Entity::Edge(e) => &e.tags,
            Entity::Line(l) => &l.tags,
            Entity::Area(a) => &a.tags,
            Entity::Relation(r) => &r.tags,
        }
    }

    /// Bounds of the entity's own geometry. Relations have none.
    pub fn bounds(&self) -> Option<Rectangle> {
        match self {
            Entity::Point(p) => Some(p.location.bounds()),
            Entity::Node(n) => Some(n.location.bounds()),
            Entity::Edge(e) => e.polyline.bounds(),
            Entity::Line(l) => l.polyline.bounds(),
            Entity::Area(a) => a.polygon.bounds(),
            Entity::Relation(_) => None,
        }
    }
}

impl fmt::Display for Entity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference())?;
        match self {
            Entity::Point(p) => write!(f, " at {}", p.location)?,
            Entity::Node(n) => write!(f, " at {}", n.location)?,
            Entity::Edge(e) => write!(
                f,
                " {} -> {} ({} vertices)",
                e.start_node,
                e.end_node,
                e.polyline.len()
            )?,
            Entity::Line(l) => write!(f, " ({} vertices)", l.polyline.len())?,
            Entity::Area(a) => write!(f, " ({} vertices)", a.polygon.len())?,
            Entity::Relation(r) => {
                write!(f, " [")?;
                for (i, member) in r.members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", member.reference, member.role)?;
                }
                write!(f, "]")?;
            }
        }
        write!(f, " {{")?;
        for (i, (key, value)) in self.tags().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_order_follows_declaration() {
        let mut shuffled = vec![ItemType::Relation, ItemType::Point, ItemType::Edge];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![ItemType::Point, ItemType::Edge, ItemType::Relation]
        );
    }

    #[test]
    fn test_positions_of_reports_every_slot() {
        let relation = Relation {
            identifier: 9,
            members: vec![
                RelationMember::new(ItemType::Edge, 1, "outer"),
                RelationMember::new(ItemType::Node, 1, "via"),
                RelationMember::new(ItemType::Edge, 1, "inner"),
            ],
            tags: Tags::new(),
        };
        let positions = relation.positions_of(EntityReference::new(ItemType::Edge, 1));
        assert_eq!(positions, vec![(0, "outer"), (2, "inner")]);
    }

    #[test]
    fn test_entity_display_is_stable() {
        let mut tags = Tags::new();
        tags.insert("name".to_string(), "a".to_string());
        tags.insert("highway".to_string(), "primary".to_string());
        let node = Node {
            identifier: 1,
            location: Location::new(10, 20),
            tags,
        };
        assert_eq!(
            Entity::Node(&node).to_string(),
            "Node 1 at (0.0000010,0.0000020) {highway=primary, name=a}"
        );
    }
}
