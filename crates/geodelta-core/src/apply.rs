//! Change application
//!
//! [`ChangeApplier`] materializes a new snapshot from a base snapshot and a
//! [`ChangeSetStore`].
//!
//! ## Contract
//!
//! - **One-shot**: the first successful [`ChangeApplier::get`] builds and
//!   caches the result; later calls return the cache without reapplying.
//! - **Delete wins**: a delete and an update for the same entity drop it.
//! - **Dependency order**: a created relation whose members include other
//!   relations is only added once all of them exist in the output.
//! - **Bounded**: resolution stops after [`MAX_RESOLUTION_ROUNDS`] rounds,
//!   or as soon as a round makes no progress, with `RelationCycleOverflow`.
//! - **Single-writer**: the applier is `!Sync`; the built snapshot is
//!   immutable and may be shared freely.
//!
//! ## Example
//!
//! ```
//! use geodelta_core::apply::ChangeApplier;
//! use geodelta_core::atlas::{Atlas, MemoryAtlas};
//! use geodelta_core::changeset::ChangeSetStore;
//!
//! let base = MemoryAtlas::empty("base");
//! let changes = ChangeSetStore::new("1", "nothing to do");
//! let applier = ChangeApplier::new(&base, &changes);
//! let result = applier.get().unwrap();
//! assert!(result.is_empty());
//! ```

#![allow(clippy::result_large_err)]

use crate::atlas::{Atlas, MemoryAtlas, MemoryAtlasBuilder};
use crate::changeset::{ChangeAction, ChangeItem, ChangeSetStore, RelationChange};
use crate::errors::{GdError, GdErrorKind, GeoDeltaError};
use crate::model::{ItemType, RelationMember};
use crate::{log_op_end, log_op_error, log_op_start};
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::time::Instant;

/// Upper bound on relation dependency resolution rounds
pub const MAX_RESOLUTION_ROUNDS: usize = 500;

/// Per-type outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCounts {
    /// Base entities copied unchanged
    pub carried: usize,
    pub updated: usize,
    pub deleted: usize,
    pub created: usize,
}

/// What a successful application did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub counts: BTreeMap<ItemType, TypeCounts>,
    /// Created relations with relation members, in the order they resolved
    pub resolution_order: Vec<i64>,
    /// Resolution rounds used (0 when nothing was deferred)
    pub rounds: usize,
}

/// Applies one change set to one base snapshot.
pub struct ChangeApplier<'a> {
    base: &'a dyn Atlas,
    changes: &'a ChangeSetStore,
    result: OnceCell<MemoryAtlas>,
    report: OnceCell<ApplyReport>,
}

/// Apply `changes` to `base` and return the new snapshot.
///
/// # Errors
///
/// See [`ChangeApplier::get`].
pub fn apply_changes(base: &dyn Atlas, changes: &ChangeSetStore) -> Result<MemoryAtlas, GdError> {
    ChangeApplier::new(base, changes).into_result()
}

impl<'a> ChangeApplier<'a> {
    pub fn new(base: &'a dyn Atlas, changes: &'a ChangeSetStore) -> Self {
        Self {
            base,
            changes,
            result: OnceCell::new(),
            report: OnceCell::new(),
        }
    }

    /// Build the new snapshot on first call, then return the cached one.
    ///
    /// # Errors
    ///
    /// - `InvalidItemType` when a change of the wrong shape reaches a path
    /// - `InvalidGeometry` / `DuplicateEntity` / `DanglingReference` from the
    ///   snapshot builder
    /// - `RelationCycleOverflow` when created relations cannot be ordered
    ///
    /// A failed build is not cached; the next call tries again.
    pub fn get(&self) -> Result<&MemoryAtlas, GdError> {
        if let Some(atlas) = self.result.get() {
            return Ok(atlas);
        }
        let (atlas, report) = self.build()?;
        let _ = self.report.set(report);
        Ok(self.result.get_or_init(|| atlas))
    }

    /// Report of the cached build, once [`get`](Self::get) has succeeded
    pub fn report(&self) -> Option<&ApplyReport> {
        self.report.get()
    }

    /// Build (or take the cached result) and release the applier
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn into_result(self) -> Result<MemoryAtlas, GdError> {
        if self.result.get().is_none() {
            return self.build().map(|(atlas, _)| atlas);
        }
        self.result.into_inner().ok_or_else(|| {
            GdError::new(GdErrorKind::Internal).with_message("cached snapshot vanished")
        })
    }

    fn build(&self) -> Result<(MemoryAtlas, ApplyReport), GdError> {
        let start = Instant::now();
        log_op_start!(
            "apply_changes",
            atlas = self.base.name(),
            change_count = self.changes.len()
        );
        match self.build_inner() {
            Ok(built) => {
                log_op_end!(
                    "apply_changes",
                    duration_ms = start.elapsed().as_millis() as u64,
                    rounds = built.1.rounds
                );
                Ok(built)
            }
            Err(err) => {
                log_op_error!(
                    "apply_changes",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Err(err)
            }
        }
    }

    fn build_inner(&self) -> Result<(MemoryAtlas, ApplyReport), GdError> {
        let name = if self.changes.version().is_empty() {
            self.base.name().to_string()
        } else {
            format!("{}@{}", self.base.name(), self.changes.version())
        };
        let mut builder = MemoryAtlasBuilder::new(name);
        let mut report = ApplyReport::default();

        for item_type in ItemType::SIMPLE {
            let counts = self.apply_simple(&mut builder, item_type)?;
            report.counts.insert(item_type, counts);
        }
        self.apply_relations(&mut builder, &mut report)?;

        let atlas = builder
            .build()
            .map_err(|e| GdError::from(e).with_op("apply_changes"))?;
        Ok((atlas, report))
    }

    /// Carry forward, update or drop base entities of one simple type, then
    /// add the created ones.
    fn apply_simple(
        &self,
        builder: &mut MemoryAtlasBuilder,
        item_type: ItemType,
    ) -> Result<TypeCounts, GdError> {
        if item_type == ItemType::Relation {
            return Err(GdError::from(GeoDeltaError::InvalidItemType {
                item_type,
                reason: "relations are not applied through the simple-entity path".to_string(),
            })
            .with_op("apply_simple"));
        }
        let mut counts = TypeCounts::default();

        for entity in self.base.entities(item_type) {
            let identifier = entity.identifier();
            if self
                .changes
                .contains_with_action(identifier, item_type, ChangeAction::Delete)
            {
                counts.deleted += 1;
                continue;
            }
            match self
                .changes
                .get_with_action(identifier, item_type, ChangeAction::Update)
            {
                Some(item) => {
                    add_simple_change(builder, item)?;
                    counts.updated += 1;
                }
                None => {
                    builder.add_entity(entity).map_err(GdError::from)?;
                    counts.carried += 1;
                }
            }
        }

        for item in self
            .changes
            .iter_filtered(Some(item_type), Some(ChangeAction::Create))
        {
            add_simple_change(builder, item)?;
            counts.created += 1;
        }
        Ok(counts)
    }

    fn apply_relations(
        &self,
        builder: &mut MemoryAtlasBuilder,
        report: &mut ApplyReport,
    ) -> Result<(), GdError> {
        let mut counts = TypeCounts::default();

        // Existing relations
        for relation in self.base.entities(ItemType::Relation) {
            let identifier = relation.identifier();
            if self
                .changes
                .contains_with_action(identifier, ItemType::Relation, ChangeAction::Delete)
            {
                counts.deleted += 1;
                continue;
            }
            if let Some(item) =
                self.changes
                    .get_with_action(identifier, ItemType::Relation, ChangeAction::Update)
            {
                let change = relation_change(item)?;
                builder
                    .add_relation(identifier, change.members().to_vec(), item.tags().clone())
                    .map_err(GdError::from)?;
                counts.updated += 1;
                continue;
            }
            let Some(base_relation) = self.base.relation(identifier) else {
                continue;
            };
            let members = self.carried_members(identifier, &base_relation.members);
            builder
                .add_relation(identifier, members, base_relation.tags.clone())
                .map_err(GdError::from)?;
            counts.carried += 1;
        }

        // Created relations: independent ones now, the rest deferred
        let mut pending: Vec<&RelationChange> = Vec::new();
        for item in self
            .changes
            .iter_filtered(Some(ItemType::Relation), Some(ChangeAction::Create))
        {
            let change = relation_change(item)?;
            if change.relation_member_ids().is_empty() {
                add_relation_change(builder, item, change)?;
                counts.created += 1;
            } else {
                pending.push(change);
            }
        }

        // Deferred relations, one round at a time
        let mut round = 0;
        while !pending.is_empty() {
            round += 1;
            if round > MAX_RESOLUTION_ROUNDS {
                return Err(cycle_overflow(&pending, round - 1));
            }
            let before = pending.len();
            let mut waiting = Vec::with_capacity(before);
            for change in pending {
                let missing: Vec<i64> = change
                    .relation_member_ids()
                    .into_iter()
                    .filter(|id| !builder.contains(ItemType::Relation, *id))
                    .collect();
                if missing.is_empty() {
                    let identifier = change.identifier();
                    builder
                        .add_relation(identifier, change.members().to_vec(), change.tags().clone())
                        .map_err(GdError::from)?;
                    report.resolution_order.push(identifier);
                    counts.created += 1;
                } else {
                    tracing::debug!(
                        relation = change.identifier(),
                        round,
                        missing = ?missing,
                        "relation waiting on members"
                    );
                    waiting.push(change);
                }
            }
            pending = waiting;
            if pending.len() == before {
                return Err(cycle_overflow(&pending, round));
            }
        }

        report.rounds = round;
        report.counts.insert(ItemType::Relation, counts);
        Ok(())
    }

    /// Base members, rebuilt one by one; members this change set deletes
    /// are left out
    fn carried_members(&self, relation: i64, members: &[RelationMember]) -> Vec<RelationMember> {
        members
            .iter()
            .filter(|member| {
                let reference = member.reference;
                let deleted = self.changes.contains_with_action(
                    reference.identifier,
                    reference.item_type,
                    ChangeAction::Delete,
                );
                if deleted {
                    tracing::debug!(
                        relation,
                        member = %reference,
                        "dropping deleted member from carried relation"
                    );
                }
                !deleted
            })
            .map(|member| RelationMember {
                reference: member.reference,
                role: member.role.clone(),
            })
            .collect()
    }
}

fn relation_change(item: &ChangeItem) -> Result<&RelationChange, GdError> {
    match item {
        ChangeItem::Relation(change) => Ok(change),
        ChangeItem::Simple(_) => Err(GdError::from(GeoDeltaError::InvalidItemType {
            item_type: item.item_type(),
            reason: "expected a relation change".to_string(),
        })
        .with_op("apply_relations")),
    }
}

fn add_relation_change(
    builder: &mut MemoryAtlasBuilder,
    item: &ChangeItem,
    change: &RelationChange,
) -> Result<(), GdError> {
    builder
        .add_relation(item.identifier(), change.members().to_vec(), item.tags().clone())
        .map_err(GdError::from)
}

fn add_simple_change(builder: &mut MemoryAtlasBuilder, item: &ChangeItem) -> Result<(), GdError> {
    let ChangeItem::Simple(change) = item else {
        return Err(GdError::from(GeoDeltaError::InvalidItemType {
            item_type: item.item_type(),
            reason: "relation change on the simple-entity path".to_string(),
        })
        .with_op("apply_simple"));
    };
    builder
        .add_simple(
            item.item_type(),
            item.identifier(),
            change.geometry().clone(),
            item.tags().clone(),
        )
        .map_err(GdError::from)
}

fn cycle_overflow(pending: &[&RelationChange], rounds: usize) -> GdError {
    let ids: Vec<String> = pending
        .iter()
        .map(|c| c.identifier().to_string())
        .collect();
    GdError::new(GdErrorKind::RelationCycleOverflow)
        .with_op("apply_relations")
        .with_message(format!(
            "{} relation(s) unresolved after {} round(s), probable cycle: {}",
            pending.len(),
            rounds,
            ids.join(", ")
        ))
}
