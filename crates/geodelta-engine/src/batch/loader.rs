use geodelta_core::atlas::{MemoryAtlas, SnapshotDocument};
use geodelta_core::errors::{GdError, GdErrorKind};
use std::path::Path;

/// Loads one snapshot shard. Called from worker threads.
pub trait SnapshotLoader: Send + Sync {
    /// # Errors
    ///
    /// Whatever prevents the shard from becoming a snapshot.
    fn load(&self, path: &Path) -> Result<MemoryAtlas, GdError>;
}

/// Reads `SnapshotDocument` JSON files. A document without a name is named
/// after its file stem.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshotLoader;

impl SnapshotLoader for JsonSnapshotLoader {
    fn load(&self, path: &Path) -> Result<MemoryAtlas, GdError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GdError::new(GdErrorKind::Io)
                .with_op("load_snapshot")
                .with_entity(path.display().to_string())
                .with_message(e.to_string())
        })?;
        let fallback_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        SnapshotDocument::from_json(&text)
            .and_then(|doc| doc.into_atlas(&fallback_name))
            .map_err(|e| {
                let cause = GdError::from(e);
                GdError::new(cause.kind())
                    .with_op("load_snapshot")
                    .with_entity(path.display().to_string())
                    .with_message("snapshot document rejected")
                    .with_source(cause)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geodelta_core::atlas::Atlas;

    #[test]
    fn test_unnamed_document_takes_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile-7.json");
        std::fs::write(
            &path,
            r#"{"nodes": [{"identifier": 1, "location": {"latitude": 0, "longitude": 0}}]}"#,
        )
        .unwrap();
        let atlas = JsonSnapshotLoader.load(&path).unwrap();
        assert_eq!(atlas.name(), "tile-7");
        assert!(atlas.node(1).is_some());
    }

    #[test]
    fn test_bad_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        let err = JsonSnapshotLoader.load(&path).unwrap_err();
        assert_eq!(err.kind(), GdErrorKind::Serialization);
        assert!(err.entity().is_some_and(|e| e.ends_with("broken.json")));
    }
}
