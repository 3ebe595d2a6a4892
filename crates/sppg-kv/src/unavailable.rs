//! A store double that fails every operation.
//!
//! Used to verify the services' degrade-to-default behavior under a store
//! outage, and as a stand-in when the store is administratively disabled.

use std::time::Duration;

use async_trait::async_trait;

use crate::store::{KeyValueStore, StoreInfo, StoreResult};
use crate::StoreError;

/// Key-value store whose every call fails with a pool error.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

fn unavailable<T>() -> StoreResult<T> {
    Err(StoreError::pool("store unavailable"))
}

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        unavailable()
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> StoreResult<()> {
        unavailable()
    }

    async fn delete(&self, _key: &str) -> StoreResult<bool> {
        unavailable()
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> StoreResult<bool> {
        unavailable()
    }

    async fn list_push(&self, _key: &str, _value: &str) -> StoreResult<u64> {
        unavailable()
    }

    async fn list_trim(&self, _key: &str, _start: isize, _stop: isize) -> StoreResult<()> {
        unavailable()
    }

    async fn list_range(&self, _key: &str, _start: isize, _stop: isize) -> StoreResult<Vec<String>> {
        unavailable()
    }

    async fn set_add(&self, _key: &str, _member: &str) -> StoreResult<bool> {
        unavailable()
    }

    async fn set_members(&self, _key: &str) -> StoreResult<Vec<String>> {
        unavailable()
    }

    async fn set_remove(&self, _key: &str, _member: &str) -> StoreResult<bool> {
        unavailable()
    }

    async fn scan_keys(&self, _pattern: &str) -> StoreResult<Vec<String>> {
        unavailable()
    }

    async fn ping(&self) -> StoreResult<()> {
        unavailable()
    }

    async fn info(&self) -> StoreResult<StoreInfo> {
        unavailable()
    }
}
