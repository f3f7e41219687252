//! Serialize a record and write it to its shard.

use crate::record::AppsInstalled;
use crate::store::{ErrorKind, ShardStore, StoreError, StoreResult};
use tracing::{debug, error};

/// Write `record` to the shard at `addr`.
///
/// In dry-run mode nothing is sent: the key and decoded value are logged at
/// `debug` and the write counts as successful. Otherwise exactly one attempt is
/// made; a failure is logged here and returned, and never affects other writes.
///
/// # Errors
///
/// Returns the [`StoreError`] of the failed attempt, or an
/// [`ErrorKind::InvalidInput`] error if the value could not be encoded.
pub fn insert_appsinstalled<S: ShardStore + ?Sized>(
    store: &S,
    addr: &str,
    record: &AppsInstalled,
    dry_run: bool,
) -> StoreResult<()> {
    let ua = record.user_apps();
    let key = record.key();

    if dry_run {
        debug!("{addr} - {key} -> {ua:?}");
        return Ok(());
    }

    ua.encode()
        .map_err(|e| StoreError::new(ErrorKind::InvalidInput, format!("{e:#}")))
        .and_then(|packed| store.set(addr, &key, &packed))
        .inspect_err(|e| error!("Cannot write to memc {addr}: {e}"))
}
