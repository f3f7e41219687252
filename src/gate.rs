//! Per-file completion: error-rate verdict and the consumed-file marker.
//!
//! The verdict is observational. A file is renamed with [`COMPLETION_MARKER`]
//! once all of its lines are handled, whatever its error rate, so a later run
//! with the same pattern will not pick it up again.

use crate::parser::LineOutcome;
use anyhow::{Context, Result, anyhow};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Default acceptable `errors / processed` ratio.
pub const NORMAL_ERR_RATE: f64 = 0.01;

/// Prefix added to a consumed file's name.
pub const COMPLETION_MARKER: char = '.';

/// Line counts for one file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileStats {
    /// Lines written successfully.
    pub processed: usize,
    /// Lines that failed at any stage.
    pub errors: usize,
    /// Blank lines; excluded from the rate.
    pub skipped: usize,
}

impl FileStats {
    #[must_use]
    pub fn from_outcomes(outcomes: &[LineOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, outcome| {
            match outcome {
                LineOutcome::Ok => acc.processed += 1,
                LineOutcome::Error => acc.errors += 1,
                LineOutcome::Skip => acc.skipped += 1,
            }
            acc
        })
    }

    /// `errors / processed`, or `None` when nothing was processed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn error_rate(&self) -> Option<f64> {
        (self.processed > 0).then(|| self.errors as f64 / self.processed as f64)
    }
}

/// Outcome of comparing a file's error rate with the threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    Accepted { error_rate: f64 },
    Failed { error_rate: f64, threshold: f64 },
}

impl Verdict {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted { error_rate } => {
                write!(f, "Acceptable error rate ({error_rate}). Successful load")
            }
            Self::Failed { error_rate, threshold } => {
                write!(f, "High error rate ({error_rate} >= {threshold}). Failed load")
            }
        }
    }
}

/// Verdict for `stats`, or `None` if no line was processed.
#[must_use]
pub fn evaluate(stats: &FileStats, threshold: f64) -> Option<Verdict> {
    let error_rate = stats.error_rate()?;
    Some(if error_rate < threshold {
        Verdict::Accepted { error_rate }
    } else {
        Verdict::Failed { error_rate, threshold }
    })
}

/// Path `path` will have once marked as consumed.
///
/// # Errors
///
/// Returns an error if `path` has no file name.
pub fn marked_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("no file name in {}", path.display()))?;
    let mut marked = std::ffi::OsString::from(COMPLETION_MARKER.to_string());
    marked.push(name);
    Ok(path.with_file_name(marked))
}

/// Rename `path` in place with the completion marker. Returns the new path.
///
/// # Errors
///
/// Returns an error if the rename fails.
pub fn dot_rename(path: &Path) -> Result<PathBuf> {
    let target = marked_path(path)?;
    std::fs::rename(path, &target)
        .with_context(|| format!("rename {} -> {}", path.display(), target.display()))?;
    Ok(target)
}

/// Close out one file: rename it, then log the error-rate verdict.
///
/// # Errors
///
/// Returns an error only if the rename fails.
pub fn complete_file(
    path: &Path,
    outcomes: &[LineOutcome],
    threshold: f64,
) -> Result<(PathBuf, FileStats, Option<Verdict>)> {
    let stats = FileStats::from_outcomes(outcomes);
    let renamed = dot_rename(path)?;

    let verdict = evaluate(&stats, threshold);
    match &verdict {
        Some(v @ Verdict::Accepted { .. }) => info!(path = %path.display(), "{v}"),
        Some(v @ Verdict::Failed { .. }) => error!(path = %path.display(), "{v}"),
        None => {}
    }
    Ok((renamed, stats, verdict))
}
