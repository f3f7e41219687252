//! Run configuration shared read-only by every worker.

use crate::gate::NORMAL_ERR_RATE;
use crate::router::{DEFAULT_SHARDS, ShardTable};
use anyhow::{Result, bail};
use std::fmt;

/// Default input pattern.
pub const DEFAULT_PATTERN: &str = "/data/appsinstalled/*.tsv.gz";
/// Files processed at once.
pub const MAX_FILE_THREADS: usize = 2;
/// Lines processed at once within one file.
pub const MAX_LINE_THREADS: usize = 4;
/// Lines read from a file before handing them to the line pool.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Immutable settings for one loader run.
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Device type to shard endpoint.
    pub shards: ShardTable,
    /// Log intended writes instead of sending them.
    pub dry_run: bool,
    /// Glob selecting input files.
    pub pattern: String,
    /// Size of the file-level worker pool.
    pub file_workers: usize,
    /// Size of the per-file line worker pool.
    pub line_workers: usize,
    /// Error rate at or above which a file's load is reported as failed.
    pub error_threshold: f64,
    /// Lines mapped per round on the line pool.
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            shards: DEFAULT_SHARDS.into_iter().collect(),
            dry_run: false,
            pattern: DEFAULT_PATTERN.to_string(),
            file_workers: MAX_FILE_THREADS,
            line_workers: MAX_LINE_THREADS,
            error_threshold: NORMAL_ERR_RATE,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl LoaderConfig {
    #[must_use]
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Check the numeric settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a pool or batch size is zero, the threshold is not
    /// a finite non-negative number, or the shard table is empty.
    pub fn validate(&self) -> Result<()> {
        if self.file_workers == 0 {
            bail!("file_workers must be at least 1");
        }
        if self.line_workers == 0 {
            bail!("line_workers must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if !self.error_threshold.is_finite() || self.error_threshold < 0.0 {
            bail!("error_threshold must be a finite non-negative number, got {}", self.error_threshold);
        }
        if self.shards.is_empty() {
            bail!("at least one shard endpoint is required");
        }
        Ok(())
    }
}

impl fmt::Display for LoaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pattern={} dry={} file_workers={} line_workers={} batch_size={} error_threshold={} shards=[{}]",
            self.pattern,
            self.dry_run,
            self.file_workers,
            self.line_workers,
            self.batch_size,
            self.error_threshold,
            self.shards
        )
    }
}

/// Builder for [`LoaderConfig`], starting from the defaults.
#[derive(Default)]
pub struct LoaderConfigBuilder {
    config: LoaderConfig,
}

impl LoaderConfigBuilder {
    #[must_use]
    pub fn shards(mut self, shards: ShardTable) -> Self {
        self.config.shards = shards;
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.pattern = pattern.into();
        self
    }

    #[must_use]
    pub fn file_workers(mut self, n: usize) -> Self {
        self.config.file_workers = n;
        self
    }

    #[must_use]
    pub fn line_workers(mut self, n: usize) -> Self {
        self.config.line_workers = n;
        self
    }

    #[must_use]
    pub fn error_threshold(mut self, threshold: f64) -> Self {
        self.config.error_threshold = threshold;
        self
    }

    #[must_use]
    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n;
        self
    }

    /// Finish and validate.
    ///
    /// # Errors
    ///
    /// See [`LoaderConfig::validate`].
    pub fn build(self) -> Result<LoaderConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
