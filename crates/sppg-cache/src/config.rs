//! Cache configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache manager configuration.
///
/// The three TTL classes map to how volatile the cached domain data is:
/// dashboard aggregates churn fast (short), list screens are medium, and
/// reference-ish data (employee rosters) can live long.
///
/// # Example (TOML)
///
/// ```toml
/// [cache]
/// short_ttl = "1m"
/// default_ttl = "5m"
/// long_ttl = "1h"
/// tag_ttl_slack = "1h"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for fast-churning entries.
    #[serde(with = "humantime_serde")]
    pub short_ttl: Duration,

    /// TTL used when the caller does not pick one.
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,

    /// TTL for slow-churning entries.
    #[serde(with = "humantime_serde")]
    pub long_ttl: Duration,

    /// Extra lifetime a tag-index set gets beyond its newest member's TTL,
    /// so the index outlives the shortest-lived member. This is a heuristic:
    /// a member stored with a much longer TTL can still outlive the index,
    /// which is tolerated because indexes only serve invalidation.
    #[serde(with = "humantime_serde")]
    pub tag_ttl_slack: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            short_ttl: Duration::from_secs(60),        // 1 minute
            default_ttl: Duration::from_secs(300),     // 5 minutes
            long_ttl: Duration::from_secs(3600),       // 1 hour
            tag_ttl_slack: Duration::from_secs(3600),  // 1 hour
        }
    }
}
