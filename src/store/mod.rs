//! Key-value store shards.
//!
//! The loader only ever needs one operation from a shard: store a value under a
//! key. [`ShardStore`] is that seam. [`MemcacheStore`] speaks the memcached text
//! protocol over a fresh connection per write; [`FakeStore`] keeps everything in
//! memory for tests and can be told to fail specific endpoints.
//!
//! Implementations are shared by all line workers, so they must be
//! `Send + Sync` and must not hold per-write state between calls.

mod fake;
mod memcache;

pub use fake::FakeStore;
pub use memcache::MemcacheStore;

use thiserror::Error;

/// Failure classes for a single store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Could not connect, or the connection broke mid-exchange.
    Network,
    /// The server answered, but did not store the value.
    Rejected,
    /// The key or value cannot be sent to this store.
    InvalidInput,
    /// The server reply did not follow the protocol.
    Protocol,
}

/// Error from one write attempt against one shard.
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct StoreError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Network, err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A set of store shards addressed by `host:port`.
pub trait ShardStore: Send + Sync {
    /// Store `value` under `key` on the shard at `addr`. One attempt, no retry.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the value was not stored for any reason.
    fn set(&self, addr: &str, key: &str, value: &[u8]) -> StoreResult<()>;
}

impl<S: ShardStore + ?Sized> ShardStore for std::sync::Arc<S> {
    fn set(&self, addr: &str, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).set(addr, key, value)
    }
}
