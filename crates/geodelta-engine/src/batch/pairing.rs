//! Shard pairing: matches snapshot files across two directory trees by file
//! name.

use geodelta_core::errors::{GdError, GdErrorKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One before/after snapshot pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardPair {
    /// File stem; names the projection files written for this pair
    pub name: String,
    pub before: PathBuf,
    pub after: PathBuf,
}

/// Pair `before` with `after`.
///
/// Two files form a single pair named after the `before` file. Two
/// directories are paired by identical file name, sorted; a file present on
/// one side only is skipped with a warning.
///
/// # Errors
///
/// - `NotFound` when either path does not exist
/// - `InvalidInput` when one path is a file and the other a directory
/// - `Io` when a directory cannot be listed
pub fn pair_shards(before: &Path, after: &Path) -> Result<Vec<ShardPair>, GdError> {
    for path in [before, after] {
        if !path.exists() {
            return Err(GdError::new(GdErrorKind::NotFound)
                .with_op("pair_shards")
                .with_entity(path.display().to_string())
                .with_message("path does not exist"));
        }
    }

    match (before.is_dir(), after.is_dir()) {
        (false, false) => Ok(vec![ShardPair {
            name: shard_name(before),
            before: before.to_path_buf(),
            after: after.to_path_buf(),
        }]),
        (true, true) => {
            let before_files = list_files(before)?;
            let mut after_files = list_files(after)?;
            let mut pairs = Vec::new();
            for (file_name, before_path) in before_files {
                match after_files.remove(&file_name) {
                    Some(after_path) => pairs.push(ShardPair {
                        name: shard_name(&before_path),
                        before: before_path,
                        after: after_path,
                    }),
                    None => tracing::warn!(shard = %file_name, "no after shard; skipped"),
                }
            }
            for file_name in after_files.keys() {
                tracing::warn!(shard = %file_name, "no before shard; skipped");
            }
            Ok(pairs)
        }
        _ => Err(GdError::new(GdErrorKind::InvalidInput)
            .with_op("pair_shards")
            .with_entity(before.display().to_string())
            .with_counterpart(after.display().to_string())
            .with_message("cannot pair a file with a directory")),
    }
}

fn shard_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn list_files(dir: &Path) -> Result<BTreeMap<String, PathBuf>, GdError> {
    let io_error = |e: std::io::Error| {
        GdError::new(GdErrorKind::Io)
            .with_op("pair_shards")
            .with_entity(dir.display().to_string())
            .with_message(e.to_string())
    };
    let mut files = BTreeMap::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(file_name) = path.file_name() {
            files.insert(file_name.to_string_lossy().into_owned(), path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_files_make_one_pair() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("region-a.json");
        let b = dir.path().join("region-b.json");
        std::fs::write(&a, "{}").unwrap();
        std::fs::write(&b, "{}").unwrap();

        let pairs = pair_shards(&a, &b).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "region-a");
    }

    #[test]
    fn test_directories_pair_by_file_name() {
        let before = tempfile::tempdir().unwrap();
        let after = tempfile::tempdir().unwrap();
        for name in ["2.json", "1.json", "only-before.json"] {
            std::fs::write(before.path().join(name), "{}").unwrap();
        }
        for name in ["1.json", "2.json", "only-after.json"] {
            std::fs::write(after.path().join(name), "{}").unwrap();
        }

        let names: Vec<String> = pair_shards(before.path(), after.path())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["1", "2"]);
    }

    #[test]
    fn test_file_against_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.json");
        std::fs::write(&file, "{}").unwrap();
        let err = pair_shards(&file, dir.path()).unwrap_err();
        assert_eq!(err.kind(), GdErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = pair_shards(&dir.path().join("nope"), dir.path()).unwrap_err();
        assert_eq!(err.kind(), GdErrorKind::NotFound);
    }
}
