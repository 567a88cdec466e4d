//! Shared fixtures for geodelta-core integration tests

use geodelta_core::atlas::{MemoryAtlas, MemoryAtlasBuilder};
use geodelta_core::changeset::{ChangeAction, RelationChange, SimpleChange};
use geodelta_core::model::{
    Geometry, ItemType, Location, PolyLine, Polygon, RelationMember, Tags,
};

/// A location on the equator, `lon` in dm7
#[allow(dead_code)]
pub fn loc(lon: i64) -> Location {
    Location::new(0, lon)
}

#[allow(dead_code)]
pub fn line(lons: &[i64]) -> PolyLine {
    PolyLine::new(lons.iter().map(|l| loc(*l)).collect())
}

#[allow(dead_code)]
pub fn square(origin: i64, size: i64) -> Polygon {
    Polygon::new(vec![
        Location::new(origin, origin),
        Location::new(origin, origin + size),
        Location::new(origin + size, origin + size),
        Location::new(origin + size, origin),
    ])
}

#[allow(dead_code)]
pub fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[allow(dead_code)]
pub fn member(item_type: ItemType, identifier: i64, role: &str) -> RelationMember {
    RelationMember::new(item_type, identifier, role)
}

/// Fluent wrapper over [`MemoryAtlasBuilder`] that panics on invalid input
#[allow(dead_code)]
pub struct AtlasFixture {
    builder: MemoryAtlasBuilder,
}

#[allow(dead_code)]
impl AtlasFixture {
    pub fn new(name: &str) -> Self {
        Self {
            builder: MemoryAtlasBuilder::new(name),
        }
    }

    pub fn point(mut self, identifier: i64, lon: i64, t: Tags) -> Self {
        self.builder.add_point(identifier, loc(lon), t).unwrap();
        self
    }

    pub fn node(self, identifier: i64, lon: i64) -> Self {
        self.tagged_node(identifier, lon, Tags::new())
    }

    pub fn tagged_node(mut self, identifier: i64, lon: i64, t: Tags) -> Self {
        self.builder.add_node(identifier, loc(lon), t).unwrap();
        self
    }

    pub fn edge(self, identifier: i64, lons: &[i64]) -> Self {
        self.tagged_edge(identifier, lons, Tags::new())
    }

    pub fn tagged_edge(mut self, identifier: i64, lons: &[i64], t: Tags) -> Self {
        self.builder.add_edge(identifier, line(lons), t).unwrap();
        self
    }

    pub fn line(mut self, identifier: i64, lons: &[i64], t: Tags) -> Self {
        self.builder.add_line(identifier, line(lons), t).unwrap();
        self
    }

    pub fn area(mut self, identifier: i64, polygon: Polygon, t: Tags) -> Self {
        self.builder.add_area(identifier, polygon, t).unwrap();
        self
    }

    pub fn relation(mut self, identifier: i64, members: Vec<RelationMember>, t: Tags) -> Self {
        self.builder.add_relation(identifier, members, t).unwrap();
        self
    }

    pub fn build(self) -> MemoryAtlas {
        self.builder.build().unwrap()
    }
}

/// Two nodes joined by one three-vertex edge: 1 (0) -> 100 -> 2 (10)
#[allow(dead_code)]
pub fn single_way(name: &str) -> AtlasFixture {
    AtlasFixture::new(name)
        .node(1, 0)
        .node(2, 10)
        .edge(100, &[0, 5, 10])
}

/// The same way split at its middle vertex into edges 200 and 201
#[allow(dead_code)]
pub fn split_way(name: &str) -> AtlasFixture {
    AtlasFixture::new(name)
        .node(1, 0)
        .node(2, 10)
        .node(3, 5)
        .edge(200, &[0, 5])
        .edge(201, &[5, 10])
}

#[allow(dead_code)]
pub fn node_change(identifier: i64, action: ChangeAction, lon: i64) -> SimpleChange {
    SimpleChange::new(
        identifier,
        ItemType::Node,
        action,
        Geometry::Location(loc(lon)),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn relation_change(
    identifier: i64,
    action: ChangeAction,
    members: Vec<RelationMember>,
) -> RelationChange {
    RelationChange::new(identifier, action, members)
}
