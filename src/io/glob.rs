//! Input discovery.
//!
//! Files are matched with a standard glob pattern and returned sorted, so runs
//! visit files in a deterministic order. A wildcard never matches a leading
//! dot, which keeps files already marked as consumed (see
//! [`crate::gate::COMPLETION_MARKER`]) out of later runs.

use anyhow::{Context, Result};
use glob::{MatchOptions, glob_with};
use std::path::PathBuf;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: true,
};

/// Expand `pattern` into a sorted list of regular files.
///
/// No match is an empty list, not an error.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or a matched entry cannot be read.
pub fn discover_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths =
        glob_with(pattern, MATCH_OPTIONS).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }
    result.sort();

    Ok(result)
}
