//! Diff options.

use serde::{Deserialize, Serialize};

/// Options for one diff run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Use fuzzy edge matching to suppress changes explained by way
    /// resectioning. Off by default; it queries candidate edges for every
    /// added, removed or changed edge.
    pub with_geometry_matching: bool,
}

impl DiffOptions {
    pub fn with_geometry_matching(mut self, enabled: bool) -> Self {
        self.with_geometry_matching = enabled;
        self
    }
}
