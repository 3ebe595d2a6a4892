//! The `KeyValueStore` trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::StoreError;

/// Convenience alias for store operation results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Introspection data returned by [`KeyValueStore::info`].
///
/// Fields are optional because not every backend can report them; the cache
/// stats surface treats a missing value as "unknown", not as zero.
#[derive(Debug, Clone, Default)]
pub struct StoreInfo {
    /// Bytes of memory used by the store, if the backend reports it.
    pub used_memory_bytes: Option<u64>,

    /// Total number of live keys, if the backend reports it.
    pub key_count: Option<u64>,
}

/// Async interface over the shared key-value store.
///
/// This is the single seam between the platform services and the underlying
/// store. Implementations must be cheap to clone behind an `Arc` and safe to
/// call concurrently; no method may block a thread.
///
/// # Semantics
///
/// The contract follows Redis conventions:
///
/// - Lists are most-recent-first: [`list_push`](Self::list_push) prepends.
/// - Keys created by list/set operations have no TTL until
///   [`expire`](Self::expire) is called on them.
/// - [`scan_keys`](Self::scan_keys) takes a glob pattern (`*` wildcard) and
///   must use cursor iteration, never a blocking full-keyspace command.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a string value. Returns `None` for a missing (or expired) key.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a string value with a TTL. Sub-second TTLs are rounded up to
    /// one second, matching the store's whole-second expiry granularity.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Delete a key. Returns `true` if a key was actually removed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Refresh the TTL of an existing key. Returns `false` if the key is
    /// absent.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Prepend a value to a list, creating it if absent. Returns the new
    /// list length.
    async fn list_push(&self, key: &str, value: &str) -> StoreResult<u64>;

    /// Trim a list to the inclusive index range `[start, stop]`. Negative
    /// indices count from the end, Redis-style.
    async fn list_trim(&self, key: &str, start: isize, stop: isize) -> StoreResult<()>;

    /// Read the inclusive index range `[start, stop]` of a list.
    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>>;

    /// Add a member to a set, creating it if absent. Returns `true` if the
    /// member was newly added.
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Read all members of a set. Returns an empty vec for a missing key.
    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Remove a member from a set. Returns `true` if the member was present.
    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Collect all keys matching a glob pattern via cursor iteration.
    async fn scan_keys(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Round-trip a liveness check.
    async fn ping(&self) -> StoreResult<()>;

    /// Backend introspection for the stats surface.
    async fn info(&self) -> StoreResult<StoreInfo>;
}
