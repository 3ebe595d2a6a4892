//! The cache entry envelope and write options.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::CacheConfig;
use std::time::Duration;

fn default_version() -> u32 {
    1
}

/// Envelope persisted around every cached payload.
///
/// `expires_at` duplicates the store TTL on purpose: reads compare against it
/// even though the store should have evicted the key already, as a guard
/// against clock skew and TTL-extension bugs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// Caller-supplied schema version for the payload.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl<T> CacheEntry<T> {
    /// Whether the embedded expiry has passed.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

/// TTL class picked by the domain presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    Short,
    Medium,
    Long,
}

impl TtlClass {
    /// Resolve the class against the configured durations.
    pub fn resolve(self, config: &CacheConfig) -> Duration {
        match self {
            TtlClass::Short => config.short_ttl,
            TtlClass::Medium => config.default_ttl,
            TtlClass::Long => config.long_ttl,
        }
    }
}

/// Options for [`CacheManager::set`](crate::CacheManager::set).
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Entry TTL; the configured default when `None`.
    pub ttl: Option<Duration>,

    /// Tags to index the entry under for bulk invalidation.
    pub tags: Vec<String>,

    /// Payload schema version stored in the envelope.
    pub version: u32,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: None,
            tags: Vec::new(),
            version: default_version(),
        }
    }
}

impl CacheOptions {
    /// Options with an explicit TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    /// Options with a tag list.
    pub fn with_tags(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Add an explicit TTL.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the payload version.
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_defaults_to_one_on_old_entries() {
        // Entries written before the version field existed must still parse.
        let json = r#"{
            "data": {"id": 1},
            "created_at": "2026-01-01T00:00:00Z",
            "expires_at": "2026-01-01T00:05:00Z"
        }"#;
        let entry: CacheEntry<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(entry.version, 1);
        assert!(entry.tags.is_empty());
        assert_eq!(entry.tenant_id, None);
    }

    #[test]
    fn test_expiry_check() {
        let now = OffsetDateTime::now_utc();
        let entry = CacheEntry {
            data: 42u32,
            created_at: now,
            expires_at: now + Duration::from_secs(60),
            version: 1,
            tenant_id: None,
            tags: vec![],
        };
        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + Duration::from_secs(61)));
    }

    #[test]
    fn test_options_builder() {
        let options = CacheOptions::with_tags(["menus", "dashboard"])
            .ttl(Duration::from_secs(30))
            .version(2);
        assert_eq!(options.ttl, Some(Duration::from_secs(30)));
        assert_eq!(options.tags, vec!["menus".to_string(), "dashboard".to_string()]);
        assert_eq!(options.version, 2);
    }
}
