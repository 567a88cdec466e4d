//! Batch configuration, loaded from TOML.
//!
//! ```toml
//! threads = 4
//! with_geometry_matching = true
//! output_dir = "out/diffs"
//! ```
//!
//! Every key is optional.

use geodelta_core::config::DiffOptions;
use geodelta_core::errors::{GdError, GdErrorKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_THREADS: usize = 8;
pub const DEFAULT_OUTPUT_DIR: &str = "diff-output";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Worker threads for shard diffs; bounds how many snapshot pairs are
    /// loaded at once
    pub threads: usize,
    pub with_geometry_matching: bool,
    /// Where projections are written
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            with_geometry_matching: false,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl BatchConfig {
    /// # Errors
    ///
    /// `Config` for malformed TOML, unknown keys, or `threads = 0`.
    pub fn from_toml_str(text: &str) -> Result<Self, GdError> {
        let config: BatchConfig = toml::from_str(text).map_err(|e| {
            GdError::new(GdErrorKind::Config)
                .with_op("load_batch_config")
                .with_message(e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// `Io` when the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: &Path) -> Result<Self, GdError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GdError::new(GdErrorKind::Io)
                .with_op("load_batch_config")
                .with_entity(path.display().to_string())
                .with_message(e.to_string())
        })?;
        Self::from_toml_str(&text)
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_geometry_matching(mut self, enabled: bool) -> Self {
        self.with_geometry_matching = enabled;
        self
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions::default().with_geometry_matching(self.with_geometry_matching)
    }

    fn validate(&self) -> Result<(), GdError> {
        if self.threads == 0 {
            return Err(GdError::new(GdErrorKind::Config)
                .with_op("load_batch_config")
                .with_message("threads must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = BatchConfig::from_toml_str("").unwrap();
        assert_eq!(config, BatchConfig::default());
        assert_eq!(config.threads, 8);
        assert!(!config.with_geometry_matching);
        assert_eq!(config.output_dir, PathBuf::from("diff-output"));
    }

    #[test]
    fn test_partial_toml_overrides_only_given_keys() {
        let config = BatchConfig::from_toml_str("with_geometry_matching = true").unwrap();
        assert!(config.with_geometry_matching);
        assert!(config.diff_options().with_geometry_matching);
        assert_eq!(config.threads, DEFAULT_THREADS);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let err = BatchConfig::from_toml_str("threads = 0").unwrap_err();
        assert_eq!(err.kind(), GdErrorKind::Config);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = BatchConfig::from_toml_str("thread = 2").unwrap_err();
        assert_eq!(err.code(), "ERR_CONFIG");
    }
}
