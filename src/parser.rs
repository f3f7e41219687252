//! Parsing of raw tab-separated lines into [`AppsInstalled`] records.
//!
//! A line has exactly five tab-separated fields:
//!
//! ```text
//! device_type \t device_id \t lat \t lon \t app_id[,app_id...]
//! ```
//!
//! Only the field count and the identity fields can reject a line. Bad app ids
//! are dropped one by one and bad coordinates become `NaN`; both cases are
//! reported at `info` level and the record is still produced.

use crate::record::AppsInstalled;
use thiserror::Error;
use tracing::info;

/// Number of tab-separated fields in a valid line.
pub const FIELD_COUNT: usize = 5;

/// Why a non-blank line could not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("expected 5 tab-separated fields, found {found}")]
    MalformedFieldCount { found: usize },

    #[error("device type or device id is empty")]
    MissingIdentity,
}

/// Result of handling one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineOutcome {
    /// Blank line; not counted anywhere.
    Skip,
    /// Record written (or would have been, in dry-run mode).
    Ok,
    /// Rejected, unroutable or failed to write.
    Error,
}

/// Parse one raw line.
///
/// Returns `Ok(None)` for a line that is empty after trimming.
///
/// # Errors
///
/// Returns a [`RejectReason`] when the line does not have exactly
/// [`FIELD_COUNT`] fields or when the device type or id is empty.
pub fn parse_line(line: &str) -> Result<Option<AppsInstalled>, RejectReason> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split('\t').collect();
    let &[dev_type, dev_id, lat, lon, raw_apps] = parts.as_slice() else {
        return Err(RejectReason::MalformedFieldCount { found: parts.len() });
    };
    if dev_type.is_empty() || dev_id.is_empty() {
        return Err(RejectReason::MissingIdentity);
    }

    let apps = parse_apps(raw_apps).unwrap_or_else(|| {
        info!("Not all user apps are digits: `{line}`");
        raw_apps
            .split(',')
            .filter_map(|a| a.trim().parse::<u32>().ok())
            .collect()
    });

    let (lat, lon) = match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
        (Ok(lat), Ok(lon)) => (lat, lon),
        (lat, lon) => {
            info!("Invalid geo coords: `{line}`");
            (lat.unwrap_or(f64::NAN), lon.unwrap_or(f64::NAN))
        }
    };

    Ok(Some(AppsInstalled {
        dev_type: dev_type.to_string(),
        dev_id: dev_id.to_string(),
        lat,
        lon,
        apps,
    }))
}

/// Strict app-id parse; `None` if any token is not an integer.
fn parse_apps(raw: &str) -> Option<Vec<u32>> {
    raw.split(',').map(|a| a.trim().parse::<u32>().ok()).collect()
}
