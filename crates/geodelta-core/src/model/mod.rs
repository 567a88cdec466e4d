//! Entity reference model shared by the diff engine and change application.

pub mod entity;
pub mod geometry;

pub use entity::{
    Area, Edge, Entity, EntityReference, ItemType, Line, Node, Point, Relation, RelationMember,
    Tags,
};
pub use geometry::{Location, PolyLine, Polygon, Rectangle};

use serde::{Deserialize, Serialize};

/// Geometry payload of a simple (non-relation) entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Location(Location),
    #[serde(rename = "polyline")]
    PolyLine(PolyLine),
    Polygon(Polygon),
}

impl Geometry {
    /// Whether this geometry kind is the one `item_type` carries
    pub fn fits(&self, item_type: ItemType) -> bool {
        matches!(
            (self, item_type),
            (Geometry::Location(_), ItemType::Point | ItemType::Node)
                | (Geometry::PolyLine(_), ItemType::Edge | ItemType::Line)
                | (Geometry::Polygon(_), ItemType::Area)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Location(_) => "location",
            Geometry::PolyLine(_) => "polyline",
            Geometry::Polygon(_) => "polygon",
        }
    }
}

impl Entity<'_> {
    /// Own geometry of a simple entity
    pub fn geometry(&self) -> Option<Geometry> {
        match self {
            Entity::Point(p) => Some(Geometry::Location(p.location)),
            Entity::Node(n) => Some(Geometry::Location(n.location)),
            Entity::Edge(e) => Some(Geometry::PolyLine(e.polyline.clone())),
            Entity::Line(l) => Some(Geometry::PolyLine(l.polyline.clone())),
            Entity::Area(a) => Some(Geometry::Polygon(a.polygon.clone())),
            Entity::Relation(_) => None,
        }
    }
}
