//! Typed change records.
//!
//! A change against a simple entity carries a geometry, a change against a
//! relation carries members. The two never mix: [`ChangeItem::set_geometry`]
//! on a relation change and [`ChangeItem::set_members`] on a simple change
//! fail with `IllegalMemberMutation`.

use crate::errors::{GeoDeltaError, Result};
use crate::model::{Geometry, ItemType, RelationMember, Tags};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
    Read,
}

impl ChangeAction {
    pub const ALL: [ChangeAction; 4] = [
        ChangeAction::Create,
        ChangeAction::Update,
        ChangeAction::Delete,
        ChangeAction::Read,
    ];
}

/// Confidence in [0, 1]. Never NaN, so it can be compared and hashed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    pub const CERTAIN: Score = Score(1.0);

    pub fn new(value: f64) -> Option<Self> {
        // -0.0 is folded into 0.0 so equal scores hash equally
        (0.0..=1.0).contains(&value).then_some(Score(value + 0.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Score {
    fn default() -> Self {
        Score::CERTAIN
    }
}

impl Eq for Score {}

impl Hash for Score {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Storage key. The action is part of the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangeKey {
    pub identifier: i64,
    pub item_type: ItemType,
    pub action: ChangeAction,
}

impl ChangeKey {
    pub fn new(identifier: i64, item_type: ItemType, action: ChangeAction) -> Self {
        Self {
            identifier,
            item_type,
            action,
        }
    }
}

/// Change to a point, node, edge, line or area
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleChange {
    identifier: i64,
    item_type: ItemType,
    action: ChangeAction,
    geometry: Geometry,
    tags: Tags,
    source_name: String,
    score: Score,
}

impl SimpleChange {
    /// # Errors
    ///
    /// - `InvalidItemType` when `item_type` is [`ItemType::Relation`]
    /// - `InvalidGeometry` when the geometry kind does not fit `item_type`
    pub fn new(
        identifier: i64,
        item_type: ItemType,
        action: ChangeAction,
        geometry: Geometry,
    ) -> Result<Self> {
        if item_type == ItemType::Relation {
            return Err(GeoDeltaError::InvalidItemType {
                item_type,
                reason: "relation changes carry members; use RelationChange".to_string(),
            });
        }
        check_geometry(item_type, identifier, &geometry)?;
        Ok(Self {
            identifier,
            item_type,
            action,
            geometry,
            tags: Tags::new(),
            source_name: String::new(),
            score: Score::CERTAIN,
        })
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }

    /// # Errors
    ///
    /// `InvalidScore` when `score` is NaN or outside [0, 1].
    pub fn with_score(mut self, score: f64) -> Result<Self> {
        self.score = validated_score(self.item_type, self.identifier, score)?;
        Ok(self)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}

/// Change to a relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationChange {
    identifier: i64,
    action: ChangeAction,
    members: Vec<RelationMember>,
    tags: Tags,
    source_name: String,
    score: Score,
}

impl RelationChange {
    pub fn new(identifier: i64, action: ChangeAction, members: Vec<RelationMember>) -> Self {
        Self {
            identifier,
            action,
            members,
            tags: Tags::new(),
            source_name: String::new(),
            score: Score::CERTAIN,
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }

    /// # Errors
    ///
    /// `InvalidScore` when `score` is NaN or outside [0, 1].
    pub fn with_score(mut self, score: f64) -> Result<Self> {
        self.score = validated_score(ItemType::Relation, self.identifier, score)?;
        Ok(self)
    }

    pub fn identifier(&self) -> i64 {
        self.identifier
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn members(&self) -> &[RelationMember] {
        &self.members
    }

    /// Identifiers of members that are themselves relations
    pub fn relation_member_ids(&self) -> Vec<i64> {
        self.members
            .iter()
            .filter(|m| m.reference.item_type == ItemType::Relation)
            .map(|m| m.reference.identifier)
            .collect()
    }
}

fn check_geometry(item_type: ItemType, identifier: i64, geometry: &Geometry) -> Result<()> {
    if geometry.fits(item_type) {
        Ok(())
    } else {
        Err(GeoDeltaError::InvalidGeometry {
            item_type,
            identifier,
            reason: format!("{} geometry does not fit this type", geometry.kind()),
        })
    }
}

fn validated_score(item_type: ItemType, identifier: i64, score: f64) -> Result<Score> {
    Score::new(score).ok_or(GeoDeltaError::InvalidScore {
        item_type,
        identifier,
        score,
    })
}

/// One actioned mutation request against one entity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeItem {
    Simple(SimpleChange),
    Relation(RelationChange),
}

impl ChangeItem {
    pub fn identifier(&self) -> i64 {
        match self {
            ChangeItem::Simple(c) => c.identifier,
            ChangeItem::Relation(c) => c.identifier,
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            ChangeItem::Simple(c) => c.item_type,
            ChangeItem::Relation(_) => ItemType::Relation,
        }
    }

    pub fn action(&self) -> ChangeAction {
        match self {
            ChangeItem::Simple(c) => c.action,
            ChangeItem::Relation(c) => c.action,
        }
    }

    pub fn key(&self) -> ChangeKey {
        ChangeKey::new(self.identifier(), self.item_type(), self.action())
    }

    pub fn tags(&self) -> &Tags {
        match self {
            ChangeItem::Simple(c) => &c.tags,
            ChangeItem::Relation(c) => &c.tags,
        }
    }

    pub fn tags_mut(&mut self) -> &mut Tags {
        match self {
            ChangeItem::Simple(c) => &mut c.tags,
            ChangeItem::Relation(c) => &mut c.tags,
        }
    }

    pub fn source_name(&self) -> &str {
        match self {
            ChangeItem::Simple(c) => &c.source_name,
            ChangeItem::Relation(c) => &c.source_name,
        }
    }

    pub fn score(&self) -> Score {
        match self {
            ChangeItem::Simple(c) => c.score,
            ChangeItem::Relation(c) => c.score,
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            ChangeItem::Simple(c) => Some(&c.geometry),
            ChangeItem::Relation(_) => None,
        }
    }

    pub fn members(&self) -> Option<&[RelationMember]> {
        match self {
            ChangeItem::Simple(_) => None,
            ChangeItem::Relation(c) => Some(&c.members),
        }
    }

    /// Replace the geometry of a simple change
    ///
    /// # Errors
    ///
    /// `IllegalMemberMutation` on a relation change, `InvalidGeometry` when
    /// the geometry kind does not fit the item type.
    pub fn set_geometry(&mut self, geometry: Geometry) -> Result<()> {
        match self {
            ChangeItem::Simple(c) => {
                check_geometry(c.item_type, c.identifier, &geometry)?;
                c.geometry = geometry;
                Ok(())
            }
            ChangeItem::Relation(c) => Err(GeoDeltaError::IllegalMemberMutation {
                item_type: ItemType::Relation,
                identifier: c.identifier,
                attempted: "geometry",
            }),
        }
    }

    /// Replace the members of a relation change
    ///
    /// # Errors
    ///
    /// `IllegalMemberMutation` on a simple change.
    pub fn set_members(&mut self, members: Vec<RelationMember>) -> Result<()> {
        match self {
            ChangeItem::Relation(c) => {
                c.members = members;
                Ok(())
            }
            ChangeItem::Simple(c) => Err(GeoDeltaError::IllegalMemberMutation {
                item_type: c.item_type,
                identifier: c.identifier,
                attempted: "members",
            }),
        }
    }

    /// # Errors
    ///
    /// `InvalidScore` when `score` is NaN or outside [0, 1].
    pub fn set_score(&mut self, score: f64) -> Result<()> {
        let validated = validated_score(self.item_type(), self.identifier(), score)?;
        match self {
            ChangeItem::Simple(c) => c.score = validated,
            ChangeItem::Relation(c) => c.score = validated,
        }
        Ok(())
    }
}

impl From<SimpleChange> for ChangeItem {
    fn from(change: SimpleChange) -> Self {
        ChangeItem::Simple(change)
    }
}

impl From<RelationChange> for ChangeItem {
    fn from(change: RelationChange) -> Self {
        ChangeItem::Relation(change)
    }
}
