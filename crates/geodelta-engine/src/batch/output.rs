//! Projection files for one shard pair.

use geodelta_core::diff::{relations_to_geojson, render_human_summary, to_geojson, Diff};
use geodelta_core::errors::{GdError, GdErrorKind};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Paths written for one shard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardOutputs {
    /// `<shard>.diff.txt`
    pub summary: PathBuf,
    /// `<shard>.diff.geojson`
    pub geojson: PathBuf,
    /// `<shard>.relations.geojson`
    pub relations: PathBuf,
}

impl ShardOutputs {
    pub fn for_shard(output_dir: &Path, shard: &str) -> Self {
        Self {
            summary: output_dir.join(format!("{shard}.diff.txt")),
            geojson: output_dir.join(format!("{shard}.diff.geojson")),
            relations: output_dir.join(format!("{shard}.relations.geojson")),
        }
    }
}

/// Write the text summary and both GeoJSON projections of `diffs`.
///
/// # Errors
///
/// `Io` when the directory or a file cannot be written, `Serialization` if
/// GeoJSON encoding fails.
pub fn write_projections(
    output_dir: &Path,
    shard: &str,
    diffs: &BTreeSet<Diff<'_>>,
) -> Result<ShardOutputs, GdError> {
    std::fs::create_dir_all(output_dir).map_err(|e| io_error(output_dir, e))?;
    let outputs = ShardOutputs::for_shard(output_dir, shard);

    write(&outputs.summary, render_human_summary(diffs))?;
    write(&outputs.geojson, pretty(&to_geojson(diffs))?)?;
    write(&outputs.relations, pretty(&relations_to_geojson(diffs))?)?;
    Ok(outputs)
}

fn pretty(value: &serde_json::Value) -> Result<String, GdError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        GdError::new(GdErrorKind::Serialization)
            .with_op("write_projections")
            .with_message(e.to_string())
    })
}

fn write(path: &Path, contents: String) -> Result<(), GdError> {
    std::fs::write(path, contents).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, err: std::io::Error) -> GdError {
    GdError::new(GdErrorKind::Io)
        .with_op("write_projections")
        .with_entity(path.display().to_string())
        .with_message(err.to_string())
}
