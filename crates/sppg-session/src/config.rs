//! Session layer configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session manager configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [session]
/// lifetime = "8h"
/// activity_log_cap = 100
/// activity_log_ttl = "24h"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session lifetime; `expires_at` = creation time + lifetime unless the
    /// session is explicitly extended.
    #[serde(with = "humantime_serde")]
    pub lifetime: Duration,

    /// Maximum entries kept in a session's activity trail.
    pub activity_log_cap: usize,

    /// TTL of the activity trail. Longer than the session lifetime so the
    /// trail outlives the session it describes.
    #[serde(with = "humantime_serde")]
    pub activity_log_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(8 * 3600),         // 8 hours
            activity_log_cap: 100,
            activity_log_ttl: Duration::from_secs(24 * 3600), // 24 hours
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.lifetime, Duration::from_secs(28_800));
        assert_eq!(config.activity_log_cap, 100);
        assert!(config.activity_log_ttl > config.lifetime);
    }

    #[test]
    fn test_humantime_deserialization() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"lifetime": "2h", "activity_log_cap": 10}"#).unwrap();
        assert_eq!(config.lifetime, Duration::from_secs(7200));
        assert_eq!(config.activity_log_cap, 10);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.activity_log_ttl, Duration::from_secs(86_400));
    }
}
