//! Batch diffing of snapshot shards.
//!
//! ## Flow
//! 1. [`pair_shards`] matches before/after files by name
//! 2. [`diff_shards`] diffs every pair on a pool of `threads` workers; each
//!    worker loads its own pair, so at most `threads` pairs are in memory
//! 3. Pairs with at least one diff get three projection files in
//!    `output_dir` (see [`ShardOutputs`])
//!
//! A failing shard is logged and recorded in its [`ShardOutcome`]; the other
//! shards still run. A shard that panics is recorded the same way, with an
//! `Internal` error carrying the panic message. There is no ordering between shards while running;
//! outcomes are returned sorted by shard name.

pub mod config;
pub mod loader;
pub mod output;
pub mod pairing;
pub mod pool;

pub use config::BatchConfig;
pub use loader::{JsonSnapshotLoader, SnapshotLoader};
pub use output::{write_projections, ShardOutputs};
pub use pairing::{pair_shards, ShardPair};

use chrono::{DateTime, Utc};
use geodelta_core::diff::{DiffEngine, DiffSummaryEntry};
use geodelta_core::errors::{GdError, GdErrorKind};
use geodelta_core::{log_op_end, log_op_error, log_op_start};
use geodelta_core_types::RequestId;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

/// Result of diffing one shard pair
#[derive(Debug, Clone)]
pub struct ShardOutcome {
    pub shard: String,
    /// Every diff found, in diff order; empty on failure
    pub diffs: Vec<DiffSummaryEntry>,
    /// Files written; `None` when there was nothing to write or on failure
    pub outputs: Option<ShardOutputs>,
    pub error: Option<GdError>,
}

impl ShardOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// One batch run
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub request_id: RequestId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Sorted by shard name
    pub outcomes: Vec<ShardOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &ShardOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn diff_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.diffs.len()).sum()
    }
}

/// Pair `before` with `after` and diff every pair with JSON snapshots.
///
/// # Errors
///
/// Only pairing errors; per-shard failures are reported in the outcomes.
pub fn diff_directories(
    config: &BatchConfig,
    before: &Path,
    after: &Path,
) -> Result<BatchReport, GdError> {
    let pairs = pair_shards(before, after)?;
    Ok(diff_shards(config, &pairs, &JsonSnapshotLoader))
}

/// Diff every pair on a bounded pool.
pub fn diff_shards(
    config: &BatchConfig,
    pairs: &[ShardPair],
    loader: &dyn SnapshotLoader,
) -> BatchReport {
    let request_id = RequestId::new();
    let started_at = Utc::now();
    let start = Instant::now();
    log_op_start!(
        "diff_shards",
        request_id = %request_id,
        shard_count = pairs.len(),
        threads = config.threads
    );

    let mut outcomes = pool::run_bounded(pairs, config.threads, |pair| {
        let shard_start = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| diff_shard(config, pair, loader)))
            .unwrap_or_else(|payload| Err(shard_panicked(pair, payload.as_ref(), shard_start)));
        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                let err = err.with_request_id(request_id.clone());
                ShardOutcome {
                    shard: pair.name.clone(),
                    diffs: Vec::new(),
                    outputs: None,
                    error: Some(err),
                }
            }
        }
    });
    outcomes.sort_by(|a, b| a.shard.cmp(&b.shard));

    let report = BatchReport {
        request_id,
        started_at,
        finished_at: Utc::now(),
        outcomes,
    };
    log_op_end!(
        "diff_shards",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = %report.request_id,
        diff_count = report.diff_count(),
        failed = report.failures().count()
    );
    report
}

fn diff_shard(
    config: &BatchConfig,
    pair: &ShardPair,
    loader: &dyn SnapshotLoader,
) -> Result<ShardOutcome, GdError> {
    let start = Instant::now();
    log_op_start!("diff_shard", shard = %pair.name);

    let result = run_shard(config, pair, loader);
    match result {
        Ok(outcome) => {
            log_op_end!(
                "diff_shard",
                duration_ms = start.elapsed().as_millis() as u64,
                shard = %pair.name,
                diff_count = outcome.diffs.len()
            );
            Ok(outcome)
        }
        Err(err) => {
            log_op_error!(
                "diff_shard",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                shard = %pair.name
            );
            Err(err)
        }
    }
}

fn shard_panicked(pair: &ShardPair, payload: &(dyn Any + Send), start: Instant) -> GdError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    let err = GdError::new(GdErrorKind::Internal)
        .with_op("diff_shard")
        .with_entity(pair.name.clone())
        .with_message(format!("shard panicked: {detail}"));
    log_op_error!(
        "diff_shard",
        err.clone(),
        duration_ms = start.elapsed().as_millis() as u64,
        shard = %pair.name
    );
    err
}

fn run_shard(
    config: &BatchConfig,
    pair: &ShardPair,
    loader: &dyn SnapshotLoader,
) -> Result<ShardOutcome, GdError> {
    let before = loader.load(&pair.before)?;
    let after = loader.load(&pair.after)?;
    let diffs = DiffEngine::new(&before, &after, config.diff_options()).generate()?;
    let outputs = if diffs.is_empty() {
        None
    } else {
        Some(write_projections(&config.output_dir, &pair.name, &diffs)?)
    };
    Ok(ShardOutcome {
        shard: pair.name.clone(),
        diffs: diffs.iter().map(DiffSummaryEntry::from).collect(),
        outputs,
        error: None,
    })
}
