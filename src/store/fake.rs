//! In-memory shard set for tests and dry experiments.

use super::{ErrorKind, ShardStore, StoreError, StoreResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type ShardStorage = Arc<Mutex<HashMap<String, HashMap<String, Vec<u8>>>>>;

/// Keeps one map per endpoint and counts every `set` call, failed or not.
#[derive(Clone, Default)]
pub struct FakeStore {
    shards: ShardStorage,
    failing: Arc<HashSet<String>>,
    calls: Arc<AtomicUsize>,
}

impl FakeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `addr` fail with a network error.
    #[must_use]
    pub fn failing_on(mut self, addr: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.failing).insert(addr.into());
        self
    }

    /// Value stored under `key` on `addr`, if any.
    #[must_use]
    pub fn get(&self, addr: &str, key: &str) -> Option<Vec<u8>> {
        self.shards
            .lock()
            .expect("shard mutex poisoned")
            .get(addr)
            .and_then(|shard| shard.get(key).cloned())
    }

    /// Number of keys stored on `addr`.
    #[must_use]
    pub fn len(&self, addr: &str) -> usize {
        self.shards
            .lock()
            .expect("shard mutex poisoned")
            .get(addr)
            .map_or(0, HashMap::len)
    }

    /// Total number of `set` calls seen, including failed ones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ShardStore for FakeStore {
    fn set(&self, addr: &str, key: &str, value: &[u8]) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(addr) {
            return Err(StoreError::new(
                ErrorKind::Network,
                format!("connection to {addr} refused"),
            ));
        }
        self.shards
            .lock()
            .expect("shard mutex poisoned")
            .entry(addr.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
