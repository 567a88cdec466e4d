//! Human-readable rendering of a diff set.

use crate::diff::model::{Diff, DiffType};
use std::collections::BTreeSet;

/// Render a deterministic multi-line text summary.
///
/// The header carries snapshot names and per-type counts. Each diff is one
/// line followed by the before and after entity, when present.
pub fn render_human_summary(diffs: &BTreeSet<Diff<'_>>) -> String {
    let mut out = String::new();

    out.push_str("## Atlas Diff\n\n");
    if let Some(first) = diffs.iter().next() {
        out.push_str(&format!(
            "before: {}\nafter: {}\n",
            first.before_atlas().name(),
            first.after_atlas().name()
        ));
    }

    let count = |diff_type: DiffType| diffs.iter().filter(|d| d.diff_type() == diff_type).count();
    out.push_str(&format!(
        "added: {}  changed: {}  removed: {}\n\n",
        count(DiffType::Added),
        count(DiffType::Changed),
        count(DiffType::Removed)
    ));

    if diffs.is_empty() {
        out.push_str("_No differences._\n");
        return out;
    }

    for diff in diffs {
        out.push_str(&format!("{}\n", diff));
        if let Some(entity) = diff.before_entity() {
            out.push_str(&format!("  before: {}\n", entity));
        }
        if let Some(entity) = diff.after_entity() {
            out.push_str(&format!("  after:  {}\n", entity));
        }
    }
    out
}
