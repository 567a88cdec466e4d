//! Serializable snapshot document.
//!
//! The on-disk form of a [`MemoryAtlas`]: flat entity lists, ascending by
//! identifier when produced by [`SnapshotDocument::from_atlas`]. Edges are
//! stored without their endpoint nodes, which are re-derived on load.

use crate::atlas::{MemoryAtlas, MemoryAtlasBuilder};
use crate::errors::Result;
use crate::model::{Area, Line, Node, Point, PolyLine, Relation, Tags};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub identifier: i64,
    pub polyline: PolyLine,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl SnapshotDocument {
    pub fn from_atlas(atlas: &MemoryAtlas) -> Self {
        Self {
            name: atlas.name.clone(),
            points: atlas.points.values().cloned().collect(),
            nodes: atlas.nodes.values().cloned().collect(),
            edges: atlas
                .edges
                .values()
                .map(|e| EdgeRecord {
                    identifier: e.identifier,
                    polyline: e.polyline.clone(),
                    tags: e.tags.clone(),
                })
                .collect(),
            lines: atlas.lines.values().cloned().collect(),
            areas: atlas.areas.values().cloned().collect(),
            relations: atlas.relations.values().cloned().collect(),
        }
    }

    /// Build a snapshot, validating identifiers, geometry and references.
    ///
    /// `fallback_name` is used when the document carries no name.
    ///
    /// # Errors
    ///
    /// Any builder error: duplicates, malformed geometry, missing edge
    /// endpoints or dangling relation members.
    pub fn into_atlas(self, fallback_name: &str) -> Result<MemoryAtlas> {
        let name = if self.name.is_empty() {
            fallback_name.to_string()
        } else {
            self.name
        };
        let mut builder = MemoryAtlasBuilder::new(name);
        for p in self.points {
            builder.add_point(p.identifier, p.location, p.tags)?;
        }
        for n in self.nodes {
            builder.add_node(n.identifier, n.location, n.tags)?;
        }
        for e in self.edges {
            builder.add_edge(e.identifier, e.polyline, e.tags)?;
        }
        for l in self.lines {
            builder.add_line(l.identifier, l.polyline, l.tags)?;
        }
        for a in self.areas {
            builder.add_area(a.identifier, a.polygon, a.tags)?;
        }
        for r in self.relations {
            builder.add_relation(r.identifier, r.members, r.tags)?;
        }
        builder.build()
    }

    /// # Errors
    ///
    /// `Serialization` when the text is not a valid document.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// # Errors
    ///
    /// `Serialization` if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
