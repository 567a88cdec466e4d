//! Fuzzy edge matching.
//!
//! Recognizes an edge that survives under a different identifier because its
//! way was split or merged ("resectioned") without moving any vertex.

use crate::model::{Edge, Location, PolyLine};
use std::collections::HashSet;

/// Decides whether an edge is still present among candidates from the other
/// snapshot.
pub trait EdgeMatcher: Send + Sync {
    /// True when the best alignment of `edge` against `candidates` is free.
    ///
    /// A candidate that is `edge`'s declared reverse is never used.
    fn has_perfect_match(&self, edge: &Edge, candidates: &[&Edge]) -> bool;
}

/// Segment-coverage alignment over integer polylines.
///
/// The alignment walks the source polyline segment by segment. A segment
/// that appears, same direction and vertex for vertex, in some candidate is
/// aligned at no cost; every other segment costs one. Splitting a way into
/// pieces keeps every segment, so the cost stays zero, while moving,
/// inserting or deleting a vertex always leaves at least one segment
/// uncovered.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolyLineMatcher;

impl PolyLineMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Number of source segments not covered by any candidate
    pub fn alignment_cost(&self, source: &PolyLine, candidates: &[&PolyLine]) -> usize {
        let covered: HashSet<(Location, Location)> = candidates
            .iter()
            .flat_map(|candidate| candidate.segments())
            .collect();
        source
            .segments()
            .filter(|segment| !covered.contains(segment))
            .count()
    }
}

impl EdgeMatcher for PolyLineMatcher {
    fn has_perfect_match(&self, edge: &Edge, candidates: &[&Edge]) -> bool {
        if edge.polyline.segments().next().is_none() {
            return false;
        }
        let usable: Vec<&PolyLine> = candidates
            .iter()
            .filter(|candidate| !edge.is_reverse_of(candidate))
            .map(|candidate| &candidate.polyline)
            .collect();
        if usable.is_empty() {
            return false;
        }
        self.alignment_cost(&edge.polyline, &usable) == 0
    }
}
