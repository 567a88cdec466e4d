use crate::atlas::{Atlas, MemoryAtlas};
use crate::errors::{GeoDeltaError, Result};
use crate::model::{
    Area, Edge, Entity, EntityReference, Geometry, ItemType, Line, Location, Node, Point,
    PolyLine, Polygon, Relation, RelationMember, Tags,
};
use std::collections::{BTreeMap, BTreeSet};

/// Accumulates entities for a new [`MemoryAtlas`].
///
/// Single-writer. Edge start/end nodes are resolved from node locations and
/// relation members are checked for existence in [`build`](Self::build), so
/// entities can be added in any order.
#[derive(Debug, Default)]
pub struct MemoryAtlasBuilder {
    name: String,
    points: BTreeMap<i64, Point>,
    nodes: BTreeMap<i64, Node>,
    edges: BTreeMap<i64, (PolyLine, Tags)>,
    lines: BTreeMap<i64, Line>,
    areas: BTreeMap<i64, Area>,
    relations: BTreeMap<i64, Relation>,
}

fn vacant<V>(map: &BTreeMap<i64, V>, item_type: ItemType, identifier: i64) -> Result<()> {
    if map.contains_key(&identifier) {
        return Err(GeoDeltaError::DuplicateEntity {
            item_type,
            identifier,
        });
    }
    Ok(())
}

fn invalid_geometry(item_type: ItemType, identifier: i64, reason: impl Into<String>) -> GeoDeltaError {
    GeoDeltaError::InvalidGeometry {
        item_type,
        identifier,
        reason: reason.into(),
    }
}

impl MemoryAtlasBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_point(&mut self, identifier: i64, location: Location, tags: Tags) -> Result<()> {
        vacant(&self.points, ItemType::Point, identifier)?;
        self.points.insert(
            identifier,
            Point {
                identifier,
                location,
                tags,
            },
        );
        Ok(())
    }

    pub fn add_node(&mut self, identifier: i64, location: Location, tags: Tags) -> Result<()> {
        vacant(&self.nodes, ItemType::Node, identifier)?;
        self.nodes.insert(
            identifier,
            Node {
                identifier,
                location,
                tags,
            },
        );
        Ok(())
    }

    pub fn add_edge(&mut self, identifier: i64, polyline: PolyLine, tags: Tags) -> Result<()> {
        vacant(&self.edges, ItemType::Edge, identifier)?;
        if polyline.len() < 2 {
            return Err(invalid_geometry(
                ItemType::Edge,
                identifier,
                "an edge needs at least two vertices",
            ));
        }
        self.edges.insert(identifier, (polyline, tags));
        Ok(())
    }

    pub fn add_line(&mut self, identifier: i64, polyline: PolyLine, tags: Tags) -> Result<()> {
        vacant(&self.lines, ItemType::Line, identifier)?;
        if polyline.len() < 2 {
            return Err(invalid_geometry(
                ItemType::Line,
                identifier,
                "a line needs at least two vertices",
            ));
        }
        self.lines.insert(
            identifier,
            Line {
                identifier,
                polyline,
                tags,
            },
        );
        Ok(())
    }

    pub fn add_area(&mut self, identifier: i64, polygon: Polygon, tags: Tags) -> Result<()> {
        vacant(&self.areas, ItemType::Area, identifier)?;
        if polygon.len() < 3 {
            return Err(invalid_geometry(
                ItemType::Area,
                identifier,
                "an area needs at least three vertices",
            ));
        }
        self.areas.insert(
            identifier,
            Area {
                identifier,
                polygon,
                tags,
            },
        );
        Ok(())
    }

    pub fn add_relation(
        &mut self,
        identifier: i64,
        members: Vec<RelationMember>,
        tags: Tags,
    ) -> Result<()> {
        vacant(&self.relations, ItemType::Relation, identifier)?;
        self.relations.insert(
            identifier,
            Relation {
                identifier,
                members,
                tags,
            },
        );
        Ok(())
    }

    /// Add a simple entity from a geometry payload
    ///
    /// # Errors
    ///
    /// `InvalidItemType` for [`ItemType::Relation`], `InvalidGeometry` when the
    /// geometry kind does not fit `item_type`.
    pub fn add_simple(
        &mut self,
        item_type: ItemType,
        identifier: i64,
        geometry: Geometry,
        tags: Tags,
    ) -> Result<()> {
        if item_type == ItemType::Relation {
            return Err(GeoDeltaError::InvalidItemType {
                item_type,
                reason: "relations carry members, not geometry".to_string(),
            });
        }
        if !geometry.fits(item_type) {
            return Err(invalid_geometry(
                item_type,
                identifier,
                format!("{} geometry does not fit this type", geometry.kind()),
            ));
        }
        match (item_type, geometry) {
            (ItemType::Point, Geometry::Location(location)) => {
                self.add_point(identifier, location, tags)
            }
            (ItemType::Node, Geometry::Location(location)) => {
                self.add_node(identifier, location, tags)
            }
            (ItemType::Edge, Geometry::PolyLine(polyline)) => {
                self.add_edge(identifier, polyline, tags)
            }
            (ItemType::Line, Geometry::PolyLine(polyline)) => {
                self.add_line(identifier, polyline, tags)
            }
            (ItemType::Area, Geometry::Polygon(polygon)) => {
                self.add_area(identifier, polygon, tags)
            }
            (item_type, _) => Err(GeoDeltaError::Internal {
                message: format!("unhandled geometry for {}", item_type),
            }),
        }
    }

    /// Copy an entity from another snapshot, keeping its identifier
    pub fn add_entity(&mut self, entity: Entity<'_>) -> Result<()> {
        match entity {
            Entity::Relation(r) => {
                self.add_relation(r.identifier, r.members.clone(), r.tags.clone())
            }
            Entity::Edge(e) => self.add_edge(e.identifier, e.polyline.clone(), e.tags.clone()),
            other => match other.geometry() {
                Some(geometry) => self.add_simple(
                    other.item_type(),
                    other.identifier(),
                    geometry,
                    other.tags().clone(),
                ),
                None => Err(GeoDeltaError::Internal {
                    message: format!("{} has no geometry", other.reference()),
                }),
            },
        }
    }

    /// Read view over what has been added so far
    pub fn contains(&self, item_type: ItemType, identifier: i64) -> bool {
        match item_type {
            ItemType::Point => self.points.contains_key(&identifier),
            ItemType::Node => self.nodes.contains_key(&identifier),
            ItemType::Edge => self.edges.contains_key(&identifier),
            ItemType::Line => self.lines.contains_key(&identifier),
            ItemType::Area => self.areas.contains_key(&identifier),
            ItemType::Relation => self.relations.contains_key(&identifier),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
            + self.nodes.len()
            + self.edges.len()
            + self.lines.len()
            + self.areas.len()
            + self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freeze into an immutable snapshot.
    ///
    /// # Errors
    ///
    /// - `MissingEdgeEndpoint` when no node sits at an edge's first or last vertex
    /// - `DanglingReference` when a relation member was never added
    pub fn build(self) -> Result<MemoryAtlas> {
        // Lowest identifier wins when several nodes share a location.
        let mut node_at: BTreeMap<Location, i64> = BTreeMap::new();
        for node in self.nodes.values() {
            node_at.entry(node.location).or_insert(node.identifier);
        }

        let mut edges = BTreeMap::new();
        let mut in_edges: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
        let mut out_edges: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
        for (identifier, (polyline, tags)) in self.edges {
            let endpoint = |end: &'static str, location: Option<Location>| -> Result<i64> {
                let location = location.ok_or_else(|| {
                    invalid_geometry(ItemType::Edge, identifier, "empty polyline")
                })?;
                node_at
                    .get(&location)
                    .copied()
                    .ok_or(GeoDeltaError::MissingEdgeEndpoint {
                        edge: identifier,
                        end,
                        location,
                    })
            };
            let start_node = endpoint("start", polyline.first())?;
            let end_node = endpoint("end", polyline.last())?;
            out_edges.entry(start_node).or_default().insert(identifier);
            in_edges.entry(end_node).or_default().insert(identifier);
            edges.insert(
                identifier,
                Edge {
                    identifier,
                    polyline,
                    start_node,
                    end_node,
                    tags,
                },
            );
        }

        let mut atlas = MemoryAtlas {
            name: self.name,
            points: self.points,
            nodes: self.nodes,
            edges,
            lines: self.lines,
            areas: self.areas,
            relations: BTreeMap::new(),
            in_edges,
            out_edges,
            parents: BTreeMap::new(),
        };

        let mut parents: BTreeMap<EntityReference, BTreeSet<i64>> = BTreeMap::new();
        for relation in self.relations.values() {
            for member in &relation.members {
                let reference = member.reference;
                let exists = match reference.item_type {
                    ItemType::Relation => self.relations.contains_key(&reference.identifier),
                    other => atlas.contains(other, reference.identifier),
                };
                if !exists {
                    return Err(GeoDeltaError::DanglingReference {
                        relation: relation.identifier,
                        member: reference,
                    });
                }
                parents
                    .entry(reference)
                    .or_default()
                    .insert(relation.identifier);
            }
        }
        atlas.relations = self.relations;
        atlas.parents = parents;
        Ok(atlas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(lon: i64) -> Location {
        Location::new(0, lon)
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let mut b = MemoryAtlasBuilder::new("t");
        b.add_node(1, loc(0), Tags::new()).unwrap();
        let err = b.add_node(1, loc(5), Tags::new()).unwrap_err();
        assert_eq!(
            err,
            GeoDeltaError::DuplicateEntity {
                item_type: ItemType::Node,
                identifier: 1
            }
        );
        // Identifiers are per type
        b.add_point(1, loc(0), Tags::new()).unwrap();
    }

    #[test]
    fn test_edge_endpoints_resolved_at_build() {
        let mut b = MemoryAtlasBuilder::new("t");
        b.add_edge(7, PolyLine::new(vec![loc(0), loc(3), loc(9)]), Tags::new())
            .unwrap();
        b.add_node(2, loc(9), Tags::new()).unwrap();
        b.add_node(1, loc(0), Tags::new()).unwrap();
        let atlas = b.build().unwrap();
        let edge = atlas.edge(7).unwrap();
        assert_eq!((edge.start_node, edge.end_node), (1, 2));
    }

    #[test]
    fn test_missing_endpoint_node_fails_build() {
        let mut b = MemoryAtlasBuilder::new("t");
        b.add_node(1, loc(0), Tags::new()).unwrap();
        b.add_edge(7, PolyLine::new(vec![loc(0), loc(9)]), Tags::new())
            .unwrap();
        let err = b.build().unwrap_err();
        assert!(matches!(
            err,
            GeoDeltaError::MissingEdgeEndpoint { edge: 7, end: "end", .. }
        ));
    }

    #[test]
    fn test_dangling_relation_member_fails_build() {
        let mut b = MemoryAtlasBuilder::new("t");
        b.add_relation(
            1,
            vec![RelationMember::new(ItemType::Relation, 2, "sub")],
            Tags::new(),
        )
        .unwrap();
        let err = b.build().unwrap_err();
        assert!(matches!(err, GeoDeltaError::DanglingReference { relation: 1, .. }));
    }

    #[test]
    fn test_add_simple_rejects_wrong_geometry_kind() {
        let mut b = MemoryAtlasBuilder::new("t");
        let err = b
            .add_simple(
                ItemType::Area,
                1,
                Geometry::Location(loc(0)),
                Tags::new(),
            )
            .unwrap_err();
        assert!(matches!(err, GeoDeltaError::InvalidGeometry { .. }));
        let err = b
            .add_simple(
                ItemType::Relation,
                1,
                Geometry::Location(loc(0)),
                Tags::new(),
            )
            .unwrap_err();
        assert!(matches!(err, GeoDeltaError::InvalidItemType { .. }));
    }

    #[test]
    fn test_contains_is_a_live_read_view() {
        let mut b = MemoryAtlasBuilder::new("t");
        assert!(!b.contains(ItemType::Relation, 4));
        b.add_relation(4, vec![], Tags::new()).unwrap();
        assert!(b.contains(ItemType::Relation, 4));
        assert!(!b.contains(ItemType::Node, 4));
    }
}
