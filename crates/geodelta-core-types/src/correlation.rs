//! Correlation identifiers
//!
//! A batch run gets one [`RequestId`]; every shard diffed under that run
//! carries it in its log events and errors so the output of a parallel run
//! can be stitched back together.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one batch run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh, time-ordered identifier (UUIDv7)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an identifier received from elsewhere
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_display_matches_inner_string() {
        let id = RequestId::from_string("run-1".to_string());
        assert_eq!(id.to_string(), "run-1");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = RequestId::from_string("r-42".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"r-42\"");
        let back: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
