//! File-level change-set application.

use crate::batch::{JsonSnapshotLoader, SnapshotLoader};
use geodelta_core::apply::{ApplyReport, ChangeApplier};
use geodelta_core::atlas::SnapshotDocument;
use geodelta_core::changeset::ChangeSetDocument;
use geodelta_core::errors::{GdError, GdErrorKind};
use geodelta_core::{log_op_end, log_op_error, log_op_start};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What [`apply_change_set`] produced
#[derive(Debug, Clone)]
pub struct ApplySummary {
    pub output_path: PathBuf,
    /// Content digest of the written snapshot (name excluded)
    pub digest: String,
    pub report: ApplyReport,
}

/// Apply the change-set document at `changes_path` to the snapshot document
/// at `base_path` and write the resulting snapshot document to
/// `output_path`.
///
/// Nothing is written unless application succeeds.
///
/// # Errors
///
/// - `Io` / `Serialization` for unreadable or malformed documents
/// - any change validation error (`InvalidGeometry`, `IllegalMemberMutation`,
///   `InvalidInput`, ...)
/// - any application error (`RelationCycleOverflow`, `DanglingReference`, ...)
pub fn apply_change_set(
    base_path: &Path,
    changes_path: &Path,
    output_path: &Path,
) -> Result<ApplySummary, GdError> {
    let start = Instant::now();
    log_op_start!(
        "apply_change_set",
        base = %base_path.display(),
        changes = %changes_path.display()
    );
    match run(base_path, changes_path, output_path) {
        Ok(summary) => {
            log_op_end!(
                "apply_change_set",
                duration_ms = start.elapsed().as_millis() as u64,
                output = %summary.output_path.display(),
                digest = %summary.digest
            );
            Ok(summary)
        }
        Err(err) => {
            log_op_error!(
                "apply_change_set",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}

fn run(base_path: &Path, changes_path: &Path, output_path: &Path) -> Result<ApplySummary, GdError> {
    let base = JsonSnapshotLoader.load(base_path)?;

    let text = std::fs::read_to_string(changes_path).map_err(|e| io_error(changes_path, e))?;
    let changes = ChangeSetDocument::from_json(&text)
        .and_then(ChangeSetDocument::into_store)
        .map_err(|e| {
            let cause = GdError::from(e);
            GdError::new(cause.kind())
                .with_op("load_change_set")
                .with_entity(changes_path.display().to_string())
                .with_message("change-set document rejected")
                .with_source(cause)
        })?;

    let applier = ChangeApplier::new(&base, &changes);
    let result = applier.get()?;
    let report = applier.report().cloned().unwrap_or_default();

    let json = SnapshotDocument::from_atlas(result)
        .to_json_pretty()
        .map_err(GdError::from)?;
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    std::fs::write(output_path, json).map_err(|e| io_error(output_path, e))?;

    Ok(ApplySummary {
        output_path: output_path.to_path_buf(),
        digest: result.digest(),
        report,
    })
}

fn io_error(path: &Path, err: std::io::Error) -> GdError {
    GdError::new(GdErrorKind::Io)
        .with_op("apply_change_set")
        .with_entity(path.display().to_string())
        .with_message(err.to_string())
}
