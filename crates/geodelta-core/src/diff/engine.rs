//! Snapshot delta computation.
//!
//! The core entry point is [`generate`], which walks two snapshots and
//! produces the ordered set of [`Diff`] records between them.

#![allow(clippy::result_large_err)]

use crate::atlas::Atlas;
use crate::config::DiffOptions;
use crate::diff::model::{Diff, DiffReason, DiffType};
use crate::errors::{GdError, GdErrorKind, GeoDeltaError};
use crate::matcher::{EdgeMatcher, PolyLineMatcher};
use crate::model::{Edge, Entity, EntityReference, ItemType, Relation, RelationMember};
use crate::{log_op_end, log_op_error, log_op_start};
use std::collections::BTreeSet;
use std::time::Instant;

/// One slot an entity occupies in a parent relation: (relation, index, role)
type Membership = (i64, usize, String);

/// Compares a before and an after snapshot.
pub struct DiffEngine<'a> {
    before: &'a dyn Atlas,
    after: &'a dyn Atlas,
    options: DiffOptions,
    matcher: Box<dyn EdgeMatcher + 'a>,
}

/// Compute the ordered difference set between two snapshots.
///
/// # Errors
///
/// `ComparisonFailure` wrapping the cause when any entity pair cannot be
/// compared, typically a `RelationConsistencyViolation`.
pub fn generate<'a>(
    before: &'a dyn Atlas,
    after: &'a dyn Atlas,
    options: DiffOptions,
) -> Result<BTreeSet<Diff<'a>>, GdError> {
    DiffEngine::new(before, after, options).generate()
}

impl<'a> DiffEngine<'a> {
    pub fn new(before: &'a dyn Atlas, after: &'a dyn Atlas, options: DiffOptions) -> Self {
        Self {
            before,
            after,
            options,
            matcher: Box::new(PolyLineMatcher::new()),
        }
    }

    /// Replace the default [`PolyLineMatcher`]
    pub fn with_matcher(mut self, matcher: impl EdgeMatcher + 'a) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Run the removed, added and changed passes.
    ///
    /// # Errors
    ///
    /// See [`generate`].
    pub fn generate(&self) -> Result<BTreeSet<Diff<'a>>, GdError> {
        let start = Instant::now();
        log_op_start!(
            "diff_generate",
            before = self.before.name(),
            after = self.after.name(),
            with_geometry_matching = self.options.with_geometry_matching
        );

        let mut diffs = BTreeSet::new();
        self.missing_pass(
            self.before,
            self.after,
            DiffType::Removed,
            DiffReason::Removed,
            &mut diffs,
        );
        self.missing_pass(
            self.after,
            self.before,
            DiffType::Added,
            DiffReason::Added,
            &mut diffs,
        );
        if let Err(err) = self.changed_pass(&mut diffs) {
            log_op_error!(
                "diff_generate",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            return Err(err);
        }

        log_op_end!(
            "diff_generate",
            duration_ms = start.elapsed().as_millis() as u64,
            diff_count = diffs.len()
        );
        Ok(diffs)
    }

    /// Entities of `from` with no counterpart in `other`
    fn missing_pass(
        &self,
        from: &'a dyn Atlas,
        other: &'a dyn Atlas,
        diff_type: DiffType,
        diff_reason: DiffReason,
        diffs: &mut BTreeSet<Diff<'a>>,
    ) {
        for item_type in ItemType::ALL {
            for entity in from.entities(item_type) {
                let identifier = entity.identifier();
                if other.contains(item_type, identifier) {
                    continue;
                }
                if let Entity::Edge(edge) = entity {
                    if self.resectioned_into(edge, other) {
                        tracing::debug!(
                            edge = identifier,
                            atlas = other.name(),
                            "edge identifier changed but geometry survives"
                        );
                        continue;
                    }
                }
                diffs.insert(Diff::new(
                    self.before,
                    self.after,
                    item_type,
                    identifier,
                    diff_type,
                    diff_reason,
                ));
            }
        }
    }

    fn changed_pass(&self, diffs: &mut BTreeSet<Diff<'a>>) -> Result<(), GdError> {
        for item_type in ItemType::ALL {
            for before_entity in self.before.entities(item_type) {
                let identifier = before_entity.identifier();
                let Some(after_entity) = self.after.entity(item_type, identifier) else {
                    continue;
                };
                let reason = self.compare(before_entity, after_entity).map_err(|source| {
                    let reference = before_entity.reference();
                    GdError::new(GdErrorKind::ComparisonFailure)
                        .with_op("diff_generate")
                        .with_entity(format!("{} in {}", reference, self.before.name()))
                        .with_counterpart(format!("{} in {}", reference, self.after.name()))
                        .with_message(format!("could not compare {}", reference))
                        .with_source(source)
                })?;
                if let Some(reason) = reason {
                    diffs.insert(Diff::new(
                        self.before,
                        self.after,
                        item_type,
                        identifier,
                        DiffType::Changed,
                        reason,
                    ));
                }
            }
        }
        Ok(())
    }

    /// First mismatch wins: tags, then relation membership, then topology.
    fn compare(
        &self,
        before: Entity<'a>,
        after: Entity<'a>,
    ) -> Result<Option<DiffReason>, GdError> {
        if before.tags() != after.tags() {
            return Ok(Some(DiffReason::Tags));
        }

        let reference = before.reference();
        if membership(self.before, reference)? != membership(self.after, reference)? {
            return Ok(Some(DiffReason::RelationMember));
        }

        let changed = match (before, after) {
            (Entity::Point(a), Entity::Point(b)) => a.location != b.location,
            (Entity::Node(a), Entity::Node(b)) => {
                a.location != b.location
                    || self.edge_sets_differ(
                        &self.before.in_edges(a.identifier),
                        &self.after.in_edges(b.identifier),
                    )
                    || self.edge_sets_differ(
                        &self.before.out_edges(a.identifier),
                        &self.after.out_edges(b.identifier),
                    )
            }
            (Entity::Edge(a), Entity::Edge(b)) => self.edge_changed(a, b),
            (Entity::Line(a), Entity::Line(b)) => a.polyline != b.polyline,
            (Entity::Area(a), Entity::Area(b)) => a.polygon != b.polygon,
            (Entity::Relation(a), Entity::Relation(b)) => {
                return Ok(self
                    .relation_changed(a, b)
                    .then_some(DiffReason::RelationTopology));
            }
            (a, b) => {
                return Err(GdError::new(GdErrorKind::Internal)
                    .with_op("diff_compare")
                    .with_message(format!(
                        "snapshots disagree on entity kind: {} vs {}",
                        a.item_type(),
                        b.item_type()
                    )))
            }
        };
        Ok(changed.then_some(DiffReason::GeometryOrTopology))
    }

    fn edge_changed(&self, before: &Edge, after: &Edge) -> bool {
        if before.polyline == after.polyline
            && before.start_node == after.start_node
            && before.end_node == after.end_node
        {
            return false;
        }
        // Each side must be covered by the other snapshot
        !(self.resectioned_into(before, self.after) && self.resectioned_into(after, self.before))
    }

    /// Edge sets differ only when both the identifier check and the
    /// geometry check fail.
    fn edge_sets_differ(&self, before: &[&Edge], after: &[&Edge]) -> bool {
        let ids = |edges: &[&Edge]| {
            let mut ids: Vec<i64> = edges.iter().map(|e| e.identifier).collect();
            ids.sort_unstable();
            ids
        };
        let basic_mismatch = ids(before) != ids(after);
        basic_mismatch && self.matched_mismatch(before, after)
    }

    fn matched_mismatch(&self, before: &[&Edge], after: &[&Edge]) -> bool {
        if !self.options.with_geometry_matching {
            return true;
        }
        let covered = |edges: &[&Edge], candidates: &[&Edge]| {
            edges
                .iter()
                .all(|edge| self.matcher.has_perfect_match(edge, candidates))
        };
        !(covered(before, after) && covered(after, before))
    }

    fn relation_changed(&self, before: &Relation, after: &Relation) -> bool {
        if before.members == after.members {
            return false;
        }
        fn non_edge(r: &Relation) -> Vec<&RelationMember> {
            r.members
                .iter()
                .filter(|m| m.reference.item_type != ItemType::Edge)
                .collect()
        }
        if non_edge(before) != non_edge(after) {
            return true;
        }

        let edge_keys = |r: &Relation| {
            let mut keys: Vec<(i64, String)> = r
                .members
                .iter()
                .filter(|m| m.reference.item_type == ItemType::Edge)
                .map(|m| (m.reference.identifier, m.role.clone()))
                .collect();
            keys.sort();
            keys
        };
        let basic_mismatch = edge_keys(before) != edge_keys(after);
        if !basic_mismatch {
            return false;
        }
        let before_edges = member_edges(self.before, before);
        let after_edges = member_edges(self.after, after);
        self.matched_mismatch(&before_edges, &after_edges)
    }

    /// Whether `edge` is fully covered by edges of `other` near it
    fn resectioned_into(&self, edge: &Edge, other: &dyn Atlas) -> bool {
        if !self.options.with_geometry_matching {
            return false;
        }
        let Some(bounds) = edge.polyline.bounds() else {
            return false;
        };
        let candidates = other.edges_intersecting(&bounds);
        self.matcher.has_perfect_match(edge, &candidates)
    }
}

/// Every slot `reference` holds in its parent relations, by relation id
fn membership(atlas: &dyn Atlas, reference: EntityReference) -> Result<Vec<Membership>, GdError> {
    let mut slots = Vec::new();
    for relation in atlas.relations_with_member(reference) {
        let positions = relation.positions_of(reference);
        if positions.is_empty() {
            return Err(GdError::from(
                GeoDeltaError::RelationConsistencyViolation {
                    relation: relation.identifier,
                    member: reference,
                },
            )
            .with_op("diff_membership"));
        }
        slots.extend(
            positions
                .into_iter()
                .map(|(index, role)| (relation.identifier, index, role.to_string())),
        );
    }
    slots.sort();
    Ok(slots)
}

/// Distinct edge members of `relation` that resolve in `atlas`
fn member_edges<'s>(atlas: &'s dyn Atlas, relation: &Relation) -> Vec<&'s Edge> {
    let ids: BTreeSet<i64> = relation
        .members
        .iter()
        .filter(|m| m.reference.item_type == ItemType::Edge)
        .map(|m| m.reference.identifier)
        .collect();
    ids.into_iter().filter_map(|id| atlas.edge(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{MemoryAtlas, MemoryAtlasBuilder};
    use crate::model::{Location, PolyLine, Tags};

    fn loc(lon: i64) -> Location {
        Location::new(0, lon)
    }

    fn line(lons: &[i64]) -> PolyLine {
        PolyLine::new(lons.iter().map(|l| loc(*l)).collect())
    }

    fn nodes(b: &mut MemoryAtlasBuilder, lons: &[(i64, i64)]) {
        for (id, lon) in lons {
            b.add_node(*id, loc(*lon), Tags::new()).unwrap();
        }
    }

    fn single_edge() -> MemoryAtlas {
        let mut b = MemoryAtlasBuilder::new("before");
        nodes(&mut b, &[(1, 0), (2, 10)]);
        b.add_edge(100, line(&[0, 5, 10]), Tags::new()).unwrap();
        b.build().unwrap()
    }

    fn split_edge() -> MemoryAtlas {
        let mut b = MemoryAtlasBuilder::new("after");
        nodes(&mut b, &[(1, 0), (2, 10), (3, 5)]);
        b.add_edge(200, line(&[0, 5]), Tags::new()).unwrap();
        b.add_edge(201, line(&[5, 10]), Tags::new()).unwrap();
        b.build().unwrap()
    }

    fn renumbered_edge() -> MemoryAtlas {
        let mut b = MemoryAtlasBuilder::new("after");
        nodes(&mut b, &[(1, 0), (2, 10)]);
        b.add_edge(300, line(&[0, 5, 10]), Tags::new()).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_node_edge_sets_require_both_checks_to_fail() {
        let before = single_edge();
        let after = renumbered_edge();
        let engine = DiffEngine::new(
            &before,
            &after,
            DiffOptions::default().with_geometry_matching(true),
        );
        // Node 1: out edge 100 became 300 with identical geometry
        assert!(!engine.edge_sets_differ(&before.out_edges(1), &after.out_edges(1)));

        let strict = DiffEngine::new(&before, &after, DiffOptions::default());
        assert!(strict.edge_sets_differ(&before.out_edges(1), &after.out_edges(1)));
    }

    #[test]
    fn test_partially_covered_edge_set_differs() {
        let before = single_edge();
        let after = split_edge();
        let engine = DiffEngine::new(
            &before,
            &after,
            DiffOptions::default().with_geometry_matching(true),
        );
        // Node 1 only keeps the first half of the split way
        assert!(engine.edge_sets_differ(&before.out_edges(1), &after.out_edges(1)));
    }

    #[test]
    fn test_edge_renumbered_endpoint_is_tolerated_with_matching() {
        let before = single_edge();
        let mut b = MemoryAtlasBuilder::new("after");
        nodes(&mut b, &[(1, 0), (9, 10)]);
        b.add_edge(100, line(&[0, 5, 10]), Tags::new()).unwrap();
        let after = b.build().unwrap();

        let engine = DiffEngine::new(
            &before,
            &after,
            DiffOptions::default().with_geometry_matching(true),
        );
        let edge_before = before.edge(100).unwrap();
        let edge_after = after.edge(100).unwrap();
        assert!(!engine.edge_changed(edge_before, edge_after));

        let strict = DiffEngine::new(&before, &after, DiffOptions::default());
        assert!(strict.edge_changed(edge_before, edge_after));
    }

    #[test]
    fn test_membership_lists_every_slot_sorted() {
        let mut b = MemoryAtlasBuilder::new("t");
        nodes(&mut b, &[(1, 0)]);
        b.add_relation(
            20,
            vec![
                RelationMember::new(ItemType::Node, 1, "a"),
                RelationMember::new(ItemType::Node, 1, "b"),
            ],
            Tags::new(),
        )
        .unwrap();
        b.add_relation(
            10,
            vec![RelationMember::new(ItemType::Node, 1, "c")],
            Tags::new(),
        )
        .unwrap();
        let atlas = b.build().unwrap();
        let slots = membership(&atlas, EntityReference::new(ItemType::Node, 1)).unwrap();
        assert_eq!(
            slots,
            vec![
                (10, 0, "c".to_string()),
                (20, 0, "a".to_string()),
                (20, 1, "b".to_string()),
            ]
        );
    }
}
