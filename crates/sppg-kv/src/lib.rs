//! Key-value store adapter for the SPPG platform services.
//!
//! Every platform service (sessions, tagged cache, security guard) talks to a
//! single shared key-value store through the [`KeyValueStore`] trait defined
//! here. Two implementations are provided:
//!
//! - [`RedisStore`]: production backend over a deadpool-redis connection pool
//! - [`MemoryStore`]: in-process backend with TTL support, used by tests and
//!   single-instance deployments
//!
//! The trait exposes only the conventional subset of store primitives the
//! services need: get/set-with-TTL/delete, list push/trim/range, set
//! add/members/remove, cursor key scan, ping and info. Nothing in this crate
//! interprets the stored values; serialization is owned by the callers.

pub mod error;
pub mod memory;
pub mod redis;
pub mod store;
pub mod unavailable;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use store::{KeyValueStore, StoreInfo, StoreResult};
pub use unavailable::UnavailableStore;
