//! Tag-indexed, multi-tenant cache for the SPPG platform.
//!
//! Values are cached under namespaced keys (`cache:{tenant|global}:{key}`)
//! wrapped in a [`CacheEntry`] envelope carrying the creation/expiry
//! timestamps, a caller-supplied version, and a tag list. For every tag, the
//! namespaced key is added to a reverse-index set
//! (`tag:{tenant|global}:{tag}`) which exists purely so
//! [`CacheManager::invalidate_by_tag`] can bulk-delete related entries — tag
//! sets are never consulted on the read path, so a stale index only wastes
//! effort during invalidation, never correctness.
//!
//! Eviction is entirely TTL-driven: the store's native expiry removes keys,
//! and reads double-check the envelope's embedded `expires_at` as a guard
//! against clock skew or TTL-extension bugs. There is no LRU.
//!
//! The pub/sub bridge in [`pubsub`] carries invalidation events between
//! instances (and to the UI-facing realtime channel); it is transport only —
//! every event resolves to one of the invalidation primitives on
//! [`CacheManager`].

pub mod config;
pub mod domains;
pub mod entry;
pub mod keys;
pub mod manager;
pub mod pubsub;

pub use config::CacheConfig;
pub use domains::CachePreset;
pub use entry::{CacheEntry, CacheOptions, TtlClass};
pub use manager::{CacheHealth, CacheManager, CacheStats};
pub use pubsub::{InvalidationEvent, InvalidationListener, PubSubError, publish_invalidation};
