//! GeoJSON projections of a diff set.
//!
//! Coordinates are emitted as `[longitude, latitude]` in degrees. Every
//! feature carries the entity's own tags plus:
//!
//! - `identifier`, `itemType`
//! - `diff`: `BEFORE` or `AFTER`, the snapshot the geometry comes from
//! - `diff:type`, `diff:reason`
//!
//! Relation diffs are projected separately by [`relations_to_geojson`]:
//! each relation is flattened to its leaf members and every ancestor
//! relation's tags are copied onto the leaf under `[REL_ID:<id>]<key>`.

use crate::atlas::Atlas;
use crate::diff::model::Diff;
use crate::model::{Entity, ItemType, Location, Relation};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

const SIDE_BEFORE: &str = "BEFORE";
const SIDE_AFTER: &str = "AFTER";

fn position(location: &Location) -> Value {
    json!([location.longitude_degrees(), location.latitude_degrees()])
}

fn positions<'l>(locations: impl IntoIterator<Item = &'l Location>) -> Value {
    Value::Array(locations.into_iter().map(position).collect())
}

/// GeoJSON geometry of a simple entity; relations have none
fn geometry(entity: &Entity<'_>) -> Option<Value> {
    match entity {
        Entity::Point(p) => Some(json!({"type": "Point", "coordinates": position(&p.location)})),
        Entity::Node(n) => Some(json!({"type": "Point", "coordinates": position(&n.location)})),
        Entity::Edge(e) => Some(json!({
            "type": "LineString",
            "coordinates": positions(e.polyline.locations()),
        })),
        Entity::Line(l) => Some(json!({
            "type": "LineString",
            "coordinates": positions(l.polyline.locations()),
        })),
        Entity::Area(a) => Some(json!({
            "type": "Polygon",
            "coordinates": [positions(&a.polygon.closed_ring())],
        })),
        Entity::Relation(_) => None,
    }
}

fn diff_properties(entity: &Entity<'_>, diff: &Diff<'_>, side: &str) -> Map<String, Value> {
    let mut properties = Map::new();
    for (key, value) in entity.tags() {
        properties.insert(key.clone(), Value::String(value.clone()));
    }
    properties.insert("identifier".to_string(), json!(entity.identifier()));
    properties.insert("itemType".to_string(), json!(entity.item_type().as_str()));
    properties.insert("diff".to_string(), json!(side));
    properties.insert("diff:type".to_string(), json!(diff.diff_type().as_str()));
    properties.insert("diff:reason".to_string(), json!(diff.diff_reason().as_str()));
    properties
}

fn feature(geometry: Value, properties: Map<String, Value>) -> Value {
    json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": Value::Object(properties),
    })
}

fn feature_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn sides<'a>(diff: &Diff<'a>) -> [(Option<Entity<'a>>, &'static str, &'a dyn Atlas); 2] {
    [
        (diff.before_entity(), SIDE_BEFORE, diff.before_atlas()),
        (diff.after_entity(), SIDE_AFTER, diff.after_atlas()),
    ]
}

/// FeatureCollection of every non-relation diff.
///
/// A changed entity yields two features (before and after); an added or
/// removed one yields a single feature.
pub fn to_geojson(diffs: &BTreeSet<Diff<'_>>) -> Value {
    let mut features = Vec::new();
    for diff in diffs.iter().filter(|d| d.item_type() != ItemType::Relation) {
        for (entity, side, _) in sides(diff) {
            let Some(entity) = entity else { continue };
            if let Some(geometry) = geometry(&entity) {
                features.push(feature(geometry, diff_properties(&entity, diff, side)));
            }
        }
    }
    feature_collection(features)
}

/// FeatureCollection of relation diffs, flattened to leaf geometries.
pub fn relations_to_geojson(diffs: &BTreeSet<Diff<'_>>) -> Value {
    let mut features = Vec::new();
    for diff in diffs.iter().filter(|d| d.item_type() == ItemType::Relation) {
        for (entity, side, atlas) in sides(diff) {
            let Some(Entity::Relation(relation)) = entity else {
                continue;
            };
            let mut path = BTreeSet::new();
            flatten(
                atlas,
                relation,
                &Map::new(),
                &mut path,
                &mut |leaf, relation_tags| {
                    if let Some(geometry) = geometry(&leaf) {
                        let mut properties = diff_properties(&leaf, diff, side);
                        properties.extend(relation_tags.clone());
                        properties.insert("relation".to_string(), json!(relation.identifier));
                        features.push(feature(geometry, properties));
                    }
                },
            );
        }
    }
    feature_collection(features)
}

/// Depth-first walk from `relation` to its leaf members.
///
/// `path` holds the relations between the root and `relation`; a member
/// already on it closes a cycle and is not entered. A sub-relation shared by
/// two parents is walked once under each.
fn flatten<'a>(
    atlas: &'a dyn Atlas,
    relation: &'a Relation,
    inherited: &Map<String, Value>,
    path: &mut BTreeSet<i64>,
    emit: &mut dyn FnMut(Entity<'a>, &Map<String, Value>),
) {
    if !path.insert(relation.identifier) {
        return;
    }
    let mut tags = inherited.clone();
    for (key, value) in &relation.tags {
        tags.insert(
            format!("[REL_ID:{}]{}", relation.identifier, key),
            Value::String(value.clone()),
        );
    }
    for member in &relation.members {
        let reference = member.reference;
        match atlas.entity(reference.item_type, reference.identifier) {
            Some(Entity::Relation(child)) => flatten(atlas, child, &tags, path, emit),
            Some(leaf) => emit(leaf, &tags),
            None => tracing::debug!(
                relation = relation.identifier,
                member = %reference,
                "relation member missing from snapshot, skipped in projection"
            ),
        }
    }
    path.remove(&relation.identifier);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_is_lon_lat() {
        let value = position(&Location::from_degrees(1.5, -2.25));
        assert_eq!(value, json!([-2.25, 1.5]));
    }

    #[test]
    fn test_empty_collection_shape() {
        let value = to_geojson(&BTreeSet::new());
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().map(|f| f.len()), Some(0));
    }
}
