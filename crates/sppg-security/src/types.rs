//! Security record types.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// What kind of authentication attempt was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptKind {
    Login,
    PasswordReset,
}

/// One authentication attempt in the per-identifier list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAttempt {
    /// Email or client IP the attempt was made against.
    pub identifier: String,
    pub attempt_type: AttemptKind,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Materialized lockout state for one identifier.
///
/// Derived from the attempt list when the failure threshold is crossed; it
/// self-expires via the store TTL and is also removed early when read after
/// `unlock_at` (clock-skew and TTL-mismatch tolerance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutRecord {
    pub identifier: String,
    #[serde(with = "time::serde::rfc3339")]
    pub locked_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub unlock_at: OffsetDateTime,
    /// Failed attempts counted in the trailing window at lock time.
    pub attempt_count: u32,
    pub reason: String,
}

impl LockoutRecord {
    /// Whether the lockout has already lapsed.
    pub fn is_stale(&self, now: OffsetDateTime) -> bool {
        now > self.unlock_at
    }
}

/// Persisted fixed-window rate-limit state for one identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitWindow {
    pub count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub window_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub window_end: OffsetDateTime,
}

/// Outcome of a rate-limit check, for the caller to act on.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining_requests: u32,
    /// When the current window ends and the count resets.
    pub reset_time: OffsetDateTime,
}

/// Result of validating a password against the policy.
///
/// Every violated rule is reported, not just the first, so the UI can show
/// the full checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// One entry in a user's security audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_id: String,
    /// Short event name, e.g. `password_changed`, `session_revoked`.
    pub event: String,
    /// Caller-shaped context; opaque to this layer.
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&AttemptKind::Login).unwrap(),
            "\"login\""
        );
        assert_eq!(
            serde_json::from_str::<AttemptKind>("\"password_reset\"").unwrap(),
            AttemptKind::PasswordReset
        );
    }

    #[test]
    fn test_lockout_staleness() {
        let now = OffsetDateTime::now_utc();
        let record = LockoutRecord {
            identifier: "a@b.c".into(),
            locked_at: now,
            unlock_at: now + std::time::Duration::from_secs(60),
            attempt_count: 5,
            reason: "too many failed login attempts".into(),
        };
        assert!(!record.is_stale(now));
        assert!(record.is_stale(now + std::time::Duration::from_secs(61)));
    }
}
