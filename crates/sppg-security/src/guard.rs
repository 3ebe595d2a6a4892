//! The security guard service.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, warn};

use sppg_kv::{KeyValueStore, StoreError, StoreResult};

use crate::config::SecurityConfig;
use crate::keys;
use crate::password;
use crate::types::{
    AttemptKind, AuditEvent, LockoutRecord, LoginAttempt, PasswordValidation, RateLimitDecision,
    RateLimitWindow,
};

/// Login-attempt tracking, lockout, rate limiting, password handling and
/// audit logging for one process.
///
/// Construct once and share behind an `Arc`. Every method degrades to the
/// permissive branch on store failure (rate limit allows, lockout reads as
/// unlocked) — availability over strict enforcement.
pub struct SecurityGuard {
    store: Arc<dyn KeyValueStore>,
    config: SecurityConfig,
}

fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|e| StoreError::serialization(e.to_string()))
}

impl SecurityGuard {
    pub fn new(store: Arc<dyn KeyValueStore>, config: SecurityConfig) -> Self {
        Self { store, config }
    }

    pub fn with_defaults(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, SecurityConfig::default())
    }

    /// Record an authentication attempt for an identifier (email or IP).
    ///
    /// Failed attempts immediately re-evaluate the lockout state from the
    /// trailing window; there is no persisted intermediate warning state.
    pub async fn record_login_attempt(
        &self,
        identifier: &str,
        success: bool,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        if let Err(e) = self
            .try_record_attempt(identifier, success, ip_address, user_agent)
            .await
        {
            warn!(error = %e, identifier, "failed to record login attempt");
        }
    }

    async fn try_record_attempt(
        &self,
        identifier: &str,
        success: bool,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> StoreResult<()> {
        let attempt = LoginAttempt {
            identifier: identifier.to_string(),
            attempt_type: AttemptKind::Login,
            timestamp: OffsetDateTime::now_utc(),
            success,
            ip_address: ip_address.map(str::to_string),
            user_agent: user_agent.map(str::to_string),
        };

        let key = keys::attempts(identifier);
        self.store.list_push(&key, &to_json(&attempt)?).await?;
        self.store
            .list_trim(&key, 0, self.config.attempt_log_cap as isize - 1)
            .await?;
        self.store.expire(&key, self.config.attempt_log_ttl).await?;

        if !success {
            self.check_and_apply_lockout(identifier).await?;
        }
        Ok(())
    }

    /// Count recent failures and materialize a lockout when the threshold is
    /// reached. Entries that fail to parse are ignored.
    async fn check_and_apply_lockout(&self, identifier: &str) -> StoreResult<()> {
        let raw = self
            .store
            .list_range(&keys::attempts(identifier), 0, -1)
            .await?;

        let now = OffsetDateTime::now_utc();
        let window_start = now - self.config.attempt_window;
        let failed = raw
            .iter()
            .filter_map(|item| serde_json::from_str::<LoginAttempt>(item).ok())
            .filter(|attempt| !attempt.success && attempt.timestamp >= window_start)
            .count() as u32;

        if failed < self.config.max_login_attempts {
            return Ok(());
        }

        let record = LockoutRecord {
            identifier: identifier.to_string(),
            locked_at: now,
            unlock_at: now + self.config.lockout_duration,
            attempt_count: failed,
            reason: "too many failed login attempts".to_string(),
        };
        self.store
            .set_ex(
                &keys::lockout(identifier),
                &to_json(&record)?,
                self.config.lockout_duration,
            )
            .await?;
        warn!(identifier, failed, "account locked");
        Ok(())
    }

    /// Current lockout state for an identifier.
    ///
    /// A record whose `unlock_at` has already passed (clock skew, TTL
    /// mismatch) is deleted and reported as unlocked.
    pub async fn is_account_locked(&self, identifier: &str) -> Option<LockoutRecord> {
        match self.try_is_locked(identifier).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, identifier, "lockout check failed, treating as unlocked");
                None
            }
        }
    }

    async fn try_is_locked(&self, identifier: &str) -> StoreResult<Option<LockoutRecord>> {
        let key = keys::lockout(identifier);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let record: LockoutRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, identifier, "dropping malformed lockout record");
                self.store.delete(&key).await?;
                return Ok(None);
            }
        };

        if record.is_stale(OffsetDateTime::now_utc()) {
            self.store.delete(&key).await?;
            debug!(identifier, "stale lockout removed on read");
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Drop an identifier's attempt history (called after successful
    /// authentication so old failures stop counting toward lockout).
    pub async fn clear_login_attempts(&self, identifier: &str) -> bool {
        match self.store.delete(&keys::attempts(identifier)).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, identifier, "failed to clear login attempts");
                false
            }
        }
    }

    /// Hash a password for storage. `None` on (rare) hashing failure.
    pub fn hash_password(&self, password: &str) -> Option<String> {
        match password::hash_password(password) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(error = %e, "password hashing failed");
                None
            }
        }
    }

    /// Verify a password against a stored hash. Malformed hashes verify as
    /// "no match" instead of propagating.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match password::verify_password(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                false
            }
        }
    }

    /// Validate a password against the configured policy.
    pub fn validate_password(&self, password: &str) -> PasswordValidation {
        password::validate_password(&self.config.password_policy, password)
    }

    /// Fixed-window rate limiting per identifier.
    ///
    /// The read-increment-write is not atomic; concurrent callers can
    /// under-count. That is accepted for best-effort throttling, and a store
    /// failure returns the permissive decision.
    pub async fn check_rate_limit(&self, identifier: &str) -> RateLimitDecision {
        match self.try_rate_limit(identifier).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, identifier, "rate limit check failed, allowing");
                RateLimitDecision {
                    allowed: true,
                    remaining_requests: self.config.max_requests_per_window,
                    reset_time: OffsetDateTime::now_utc() + self.config.rate_limit_window,
                }
            }
        }
    }

    async fn try_rate_limit(&self, identifier: &str) -> StoreResult<RateLimitDecision> {
        let key = keys::rate_limit(identifier);
        let now = OffsetDateTime::now_utc();

        let existing = match self.store.get(&key).await? {
            Some(raw) => serde_json::from_str::<RateLimitWindow>(&raw).ok(),
            None => None,
        };

        let window = match existing {
            // Still inside the stored window: bump the counter.
            Some(window) if now < window.window_end => RateLimitWindow {
                count: window.count + 1,
                ..window
            },
            // First request of a new window.
            _ => RateLimitWindow {
                count: 1,
                window_start: now,
                window_end: now + self.config.rate_limit_window,
            },
        };

        let remaining_ttl = (window.window_end - now).unsigned_abs();
        self.store
            .set_ex(&key, &to_json(&window)?, remaining_ttl)
            .await?;

        Ok(RateLimitDecision {
            allowed: window.count <= self.config.max_requests_per_window,
            remaining_requests: self
                .config
                .max_requests_per_window
                .saturating_sub(window.count),
            reset_time: window.window_end,
        })
    }

    /// Append a structured event to the user's audit trail.
    pub async fn log_security_event(
        &self,
        user_id: &str,
        event: &str,
        details: serde_json::Value,
        ip_address: Option<&str>,
    ) {
        if let Err(e) = self
            .try_log_event(user_id, event, details, ip_address)
            .await
        {
            warn!(error = %e, user_id, event, "failed to log security event");
        }
    }

    async fn try_log_event(
        &self,
        user_id: &str,
        event: &str,
        details: serde_json::Value,
        ip_address: Option<&str>,
    ) -> StoreResult<()> {
        let entry = AuditEvent {
            user_id: user_id.to_string(),
            event: event.to_string(),
            details,
            ip_address: ip_address.map(str::to_string),
            timestamp: OffsetDateTime::now_utc(),
        };

        let key = keys::audit(user_id);
        self.store.list_push(&key, &to_json(&entry)?).await?;
        self.store
            .list_trim(&key, 0, self.config.audit_log_cap as isize - 1)
            .await?;
        self.store.expire(&key, self.config.audit_log_ttl).await?;
        Ok(())
    }

    /// Read the user's audit trail, most recent first. Entries that fail to
    /// parse are skipped.
    pub async fn get_security_events(&self, user_id: &str) -> Vec<AuditEvent> {
        match self.store.list_range(&keys::audit(user_id), 0, -1).await {
            Ok(raw) => raw
                .iter()
                .filter_map(|item| serde_json::from_str(item).ok())
                .collect(),
            Err(e) => {
                warn!(error = %e, user_id, "failed to read audit trail");
                Vec::new()
            }
        }
    }
}
