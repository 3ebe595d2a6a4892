//! Security guard configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Security guard configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [security]
/// max_login_attempts = 5
/// attempt_window = "15m"
/// lockout_duration = "30m"
/// max_requests_per_window = 10
/// rate_limit_window = "15m"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Failed attempts within `attempt_window` that trigger a lockout.
    pub max_login_attempts: u32,

    /// Trailing window over which failed attempts are counted.
    #[serde(with = "humantime_serde")]
    pub attempt_window: Duration,

    /// How long a lockout lasts. The lockout record's TTL; it also
    /// self-expires without an explicit unlock step.
    #[serde(with = "humantime_serde")]
    pub lockout_duration: Duration,

    /// Maximum entries kept in an identifier's attempt list.
    pub attempt_log_cap: usize,

    /// Rolling TTL of the attempt list.
    #[serde(with = "humantime_serde")]
    pub attempt_log_ttl: Duration,

    /// Length of one rate-limit window.
    #[serde(with = "humantime_serde")]
    pub rate_limit_window: Duration,

    /// Requests allowed per identifier per window.
    pub max_requests_per_window: u32,

    /// Maximum entries kept in a user's audit list.
    pub audit_log_cap: usize,

    /// TTL of the audit list.
    #[serde(with = "humantime_serde")]
    pub audit_log_ttl: Duration,

    /// Password composition policy.
    pub password_policy: PasswordPolicy,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            attempt_window: Duration::from_secs(15 * 60),      // 15 minutes
            lockout_duration: Duration::from_secs(30 * 60),    // 30 minutes
            attempt_log_cap: 20,
            attempt_log_ttl: Duration::from_secs(24 * 3600),   // 1 day
            rate_limit_window: Duration::from_secs(15 * 60),   // 15 minutes
            max_requests_per_window: 10,
            audit_log_cap: 100,
            audit_log_ttl: Duration::from_secs(28 * 24 * 3600), // 4 weeks
            password_policy: PasswordPolicy::default(),
        }
    }
}

/// Password composition requirements.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 12,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SecurityConfig::default();
        assert_eq!(config.max_login_attempts, 5);
        assert_eq!(config.attempt_window, Duration::from_secs(900));
        assert_eq!(config.lockout_duration, Duration::from_secs(1800));
        assert_eq!(config.max_requests_per_window, 10);
        assert_eq!(config.attempt_log_cap, 20);
        assert_eq!(config.audit_log_cap, 100);
        assert_eq!(config.password_policy.min_length, 12);
    }

    #[test]
    fn test_humantime_deserialization() {
        let config: SecurityConfig =
            serde_json::from_str(r#"{"lockout_duration": "5m"}"#).unwrap();
        assert_eq!(config.lockout_duration, Duration::from_secs(300));
        assert_eq!(config.max_login_attempts, 5);
    }
}
