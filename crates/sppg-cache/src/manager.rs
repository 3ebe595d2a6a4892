//! The cache manager.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::{debug, warn};

use sppg_kv::{KeyValueStore, StoreError, StoreResult};

use crate::config::CacheConfig;
use crate::entry::{CacheEntry, CacheOptions};
use crate::keys;
use crate::pubsub::InvalidationEvent;

/// Tagged, tenant-namespaced cache over the shared key-value store.
///
/// Construct one per process and share it behind an `Arc`. Hit/miss counters
/// are process-local instance fields — multiple processes do not share
/// accounting, so [`CacheManager::hit_rate`] describes this process only.
///
/// Every public method swallows store failures into a logged safe default;
/// a store outage degrades to a 100% miss rate, never an error in the caller.
pub struct CacheManager {
    store: Arc<dyn KeyValueStore>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Hit rate as a percentage of this process's lookups.
    pub hit_rate: f64,
    /// Live `cache:*` entries, if the store could be scanned.
    pub entry_count: Option<u64>,
    /// Store memory usage, if the backend reports it.
    pub used_memory_bytes: Option<u64>,
}

/// Result of a cache health probe.
#[derive(Debug, Clone)]
pub struct CacheHealth {
    pub healthy: bool,
    /// Ping round-trip latency (meaningless when `healthy` is false).
    pub latency: Duration,
}

impl CacheManager {
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_defaults(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cache a serializable payload under `(tenant, key)`.
    ///
    /// The entry is wrapped in a [`CacheEntry`] envelope and written with the
    /// requested TTL (configured default when unset). Every tag in
    /// `options.tags` gets the namespaced key added to its reverse index,
    /// and the index TTL is pushed to entry TTL + configured slack.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        tenant: Option<&str>,
        options: CacheOptions,
    ) -> bool {
        match self.try_set(key, data, tenant, options).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, key, "cache set failed");
                false
            }
        }
    }

    async fn try_set<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        tenant: Option<&str>,
        options: CacheOptions,
    ) -> StoreResult<()> {
        let ttl = options.ttl.unwrap_or(self.config.default_ttl);
        let now = OffsetDateTime::now_utc();
        let entry = CacheEntry {
            data: serde_json::to_value(data)
                .map_err(|e| StoreError::serialization(e.to_string()))?,
            created_at: now,
            expires_at: now + ttl,
            version: options.version,
            tenant_id: tenant.map(str::to_string),
            tags: options.tags.clone(),
        };

        let namespaced = keys::cache(tenant, key);
        let json = serde_json::to_string(&entry)
            .map_err(|e| StoreError::serialization(e.to_string()))?;
        self.store.set_ex(&namespaced, &json, ttl).await?;

        for tag in &options.tags {
            let tag_key = keys::tag(tenant, tag);
            self.store.set_add(&tag_key, &namespaced).await?;
            self.store
                .expire(&tag_key, ttl + self.config.tag_ttl_slack)
                .await?;
        }

        debug!(key = %namespaced, ttl_secs = ttl.as_secs(), "cache set");
        Ok(())
    }

    /// Read a cached payload.
    ///
    /// Misses (absent key, expired envelope, undecodable payload) return
    /// `None` and bump the miss counter. An entry past its embedded
    /// `expires_at` is deleted eagerly even though the store TTL should have
    /// evicted it already.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, tenant: Option<&str>) -> Option<T> {
        match self.try_get(key, tenant).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, key, "cache get failed");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(
        &self,
        key: &str,
        tenant: Option<&str>,
    ) -> StoreResult<Option<T>> {
        let namespaced = keys::cache(tenant, key);
        let Some(raw) = self.store.get(&namespaced).await? else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };

        let entry: CacheEntry<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, key = %namespaced, "dropping undecodable cache entry");
                self.store.delete(&namespaced).await?;
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
        };

        if entry.is_expired(OffsetDateTime::now_utc()) {
            self.store.delete(&namespaced).await?;
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key = %namespaced, "expired cache entry removed on read");
            return Ok(None);
        }

        match serde_json::from_value(entry.data) {
            Ok(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(data))
            }
            Err(e) => {
                warn!(error = %e, key = %namespaced, "cached payload does not match requested type");
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    /// Delete one entry directly.
    ///
    /// Tag-index membership is left alone: stale references are tolerated
    /// and cleaned up lazily by [`invalidate_by_tag`](Self::invalidate_by_tag).
    pub async fn invalidate(&self, key: &str, tenant: Option<&str>) -> bool {
        let namespaced = keys::cache(tenant, key);
        match self.store.delete(&namespaced).await {
            Ok(removed) => {
                debug!(key = %namespaced, removed, "cache invalidated");
                removed
            }
            Err(e) => {
                warn!(error = %e, key = %namespaced, "cache invalidation failed");
                false
            }
        }
    }

    /// Delete every entry indexed under a tag, then the index itself.
    ///
    /// Returns the number of keys actually removed (stale index members that
    /// no longer exist do not count).
    pub async fn invalidate_by_tag(&self, tag: &str, tenant: Option<&str>) -> u64 {
        match self.try_invalidate_by_tag(tag, tenant).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, tag, "tag invalidation failed");
                0
            }
        }
    }

    async fn try_invalidate_by_tag(&self, tag: &str, tenant: Option<&str>) -> StoreResult<u64> {
        let tag_key = keys::tag(tenant, tag);
        let members = self.store.set_members(&tag_key).await?;

        let mut removed = 0u64;
        for member in &members {
            if self.store.delete(member).await? {
                removed += 1;
            }
        }
        self.store.delete(&tag_key).await?;

        debug!(tag = %tag_key, indexed = members.len(), removed, "tag invalidated");
        Ok(removed)
    }

    /// Delete every cache entry and tag index of one tenant.
    ///
    /// An O(keys) pattern sweep for tenant offboarding or full refresh, not
    /// routine invalidation.
    pub async fn invalidate_tenant(&self, tenant: &str) -> u64 {
        match self.try_invalidate_tenant(tenant).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, tenant, "tenant cache sweep failed");
                0
            }
        }
    }

    async fn try_invalidate_tenant(&self, tenant: &str) -> StoreResult<u64> {
        let mut removed = 0u64;
        for pattern in [
            keys::tenant_cache_pattern(tenant),
            keys::tenant_tag_pattern(tenant),
        ] {
            for key in self.store.scan_keys(&pattern).await? {
                if self.store.delete(&key).await? {
                    removed += 1;
                }
            }
        }
        debug!(tenant, removed, "tenant cache swept");
        Ok(removed)
    }

    /// Apply an invalidation event received from the pub/sub bridge.
    ///
    /// Returns the number of entries removed.
    pub async fn apply(&self, event: &InvalidationEvent) -> u64 {
        match event {
            InvalidationEvent::Key { tenant, key } => {
                u64::from(self.invalidate(key, tenant.as_deref()).await)
            }
            InvalidationEvent::Tag { tenant, tag } => {
                self.invalidate_by_tag(tag, tenant.as_deref()).await
            }
            InvalidationEvent::Tenant { tenant } => self.invalidate_tenant(tenant).await,
        }
    }

    /// Hit rate over this process's lookups, as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    /// Counters plus store introspection.
    pub async fn stats(&self) -> CacheStats {
        let entry_count = match self.store.scan_keys("cache:*").await {
            Ok(keys) => Some(keys.len() as u64),
            Err(e) => {
                warn!(error = %e, "cache key scan failed");
                None
            }
        };
        let used_memory_bytes = match self.store.info().await {
            Ok(info) => info.used_memory_bytes,
            Err(e) => {
                warn!(error = %e, "store info failed");
                None
            }
        };

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            hit_rate: self.hit_rate(),
            entry_count,
            used_memory_bytes,
        }
    }

    /// Ping round-trip with latency measurement.
    pub async fn health_check(&self) -> CacheHealth {
        let started = Instant::now();
        match self.store.ping().await {
            Ok(()) => CacheHealth {
                healthy: true,
                latency: started.elapsed(),
            },
            Err(e) => {
                warn!(error = %e, "cache health check failed");
                CacheHealth {
                    healthy: false,
                    latency: started.elapsed(),
                }
            }
        }
    }
}
