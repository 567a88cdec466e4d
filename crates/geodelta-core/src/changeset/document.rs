//! JSON form of a change set, as written by an external change producer.

use crate::changeset::item::{ChangeAction, ChangeItem, RelationChange, SimpleChange};
use crate::changeset::store::ChangeSetStore;
use crate::errors::{GeoDeltaError, Result};
use crate::model::{Geometry, ItemType, Location, PolyLine, Polygon, RelationMember, Tags};
use serde::{Deserialize, Serialize};

fn default_score() -> f64 {
    1.0
}

/// One change as it appears on the wire.
///
/// `geometry` is required for simple types and forbidden for relations;
/// `members` is the reverse. A DELETE of a simple type may omit its
/// geometry, since applying a delete never reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub identifier: i64,
    pub item_type: ItemType,
    pub action: ChangeAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<RelationMember>>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub source_name: String,
    #[serde(default = "default_score")]
    pub score: f64,
}

impl ChangeRecord {
    /// Validate into a typed [`ChangeItem`]
    ///
    /// # Errors
    ///
    /// - `IllegalMemberMutation` for geometry on a relation or members on a
    ///   simple type
    /// - `InvalidGeometry` for a mismatched geometry, or a missing one on
    ///   anything but a DELETE
    /// - `InvalidScore` for a score outside [0, 1]
    pub fn into_item(self) -> Result<ChangeItem> {
        if self.item_type == ItemType::Relation {
            if self.geometry.is_some() {
                return Err(GeoDeltaError::IllegalMemberMutation {
                    item_type: ItemType::Relation,
                    identifier: self.identifier,
                    attempted: "geometry",
                });
            }
            let change =
                RelationChange::new(self.identifier, self.action, self.members.unwrap_or_default())
                    .with_tags(self.tags)
                    .with_source_name(self.source_name)
                    .with_score(self.score)?;
            return Ok(change.into());
        }

        if self.members.as_ref().is_some_and(|m| !m.is_empty()) {
            return Err(GeoDeltaError::IllegalMemberMutation {
                item_type: self.item_type,
                identifier: self.identifier,
                attempted: "members",
            });
        }
        let geometry = match self.geometry {
            Some(geometry) => geometry,
            None if self.action == ChangeAction::Delete => empty_geometry(self.item_type),
            None => {
                return Err(GeoDeltaError::InvalidGeometry {
                    item_type: self.item_type,
                    identifier: self.identifier,
                    reason: "missing geometry".to_string(),
                })
            }
        };
        let change = SimpleChange::new(self.identifier, self.item_type, self.action, geometry)?
            .with_tags(self.tags)
            .with_source_name(self.source_name)
            .with_score(self.score)?;
        Ok(change.into())
    }

    pub fn from_item(item: &ChangeItem) -> Self {
        Self {
            identifier: item.identifier(),
            item_type: item.item_type(),
            action: item.action(),
            geometry: item.geometry().cloned(),
            members: item.members().map(|m| m.to_vec()),
            tags: item.tags().clone(),
            source_name: item.source_name().to_string(),
            score: item.score().value(),
        }
    }
}

/// Stand-in geometry of the right kind for a geometry-less DELETE
fn empty_geometry(item_type: ItemType) -> Geometry {
    match item_type {
        ItemType::Edge | ItemType::Line => Geometry::PolyLine(PolyLine::new(Vec::new())),
        ItemType::Area => Geometry::Polygon(Polygon::new(Vec::new())),
        _ => Geometry::Location(Location::new(0, 0)),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSetDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub changes: Vec<ChangeRecord>,
}

impl ChangeSetDocument {
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

    /// Validate every record and collect them into a store
    ///
    /// # Errors
    ///
    /// The first record that fails [`ChangeRecord::into_item`].
    pub fn into_store(self) -> Result<ChangeSetStore> {
        let mut store = ChangeSetStore::new(self.version, self.description);
        for record in self.changes {
            store.add(record.into_item()?);
        }
        Ok(store)
    }

    pub fn from_store(store: &ChangeSetStore) -> Self {
        Self {
            version: store.version().to_string(),
            description: store.description().to_string(),
            changes: store.iter().map(ChangeRecord::from_item).collect(),
        }
    }
}
