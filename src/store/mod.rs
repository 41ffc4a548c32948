//! Key-value storage abstraction.
//!
//! Every record the gateway reads or writes (clients, API keys, credit
//! balances, usage counters) lives behind the [`KeyStore`] trait so the
//! backing store can be swapped without touching the services. The
//! in-memory implementation in [`memory`] is the default backend; a
//! networked store only needs to implement the same five operations.

use async_trait::async_trait;
use std::time::Duration;

/// Logical key layout helpers
pub mod keys;
/// In-memory store backed by a concurrent map
pub mod memory;

/// Error returned by key-value store operations.
///
/// The in-memory backend never fails, but the trait keeps the error
/// channel open for networked implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("store operation failed: {0}")]
    Backend(String),
}

/// Asynchronous key-value store.
///
/// Values are JSON text (or bare strings for counters); callers own
/// serialization. Keys are namespaced by prefix, see [`keys`].
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Store `value` under `key` with a time-to-live.
    ///
    /// After `ttl` elapses the entry behaves as if it was deleted.
    async fn put_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Delete the entry under `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List all live keys starting with `prefix`, sorted.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
