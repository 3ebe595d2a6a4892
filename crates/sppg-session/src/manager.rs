//! The session manager.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use rand::Rng;
use time::OffsetDateTime;
use tracing::{debug, warn};

use sppg_kv::{KeyValueStore, StoreError, StoreResult};

use crate::config::SessionConfig;
use crate::keys;
use crate::types::{ActivityEntry, NewSession, SessionRecord};

/// Creates, reads, extends and destroys per-user sessions.
///
/// Construct one per process and share it behind an `Arc`; it holds no
/// per-request state beyond the store handle.
///
/// All public methods swallow store failures: they log with context and
/// return the safe default (`None`, `false`, empty, `0`). There is no retry
/// and no queueing.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    config: SessionConfig,
}

/// 256-bit random token, hex-encoded. Collisions are accepted as negligible;
/// there is no uniqueness check on create.
fn generate_session_id() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|e| StoreError::serialization(e.to_string()))
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Manager with the stock 8-hour lifetime.
    pub fn with_defaults(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, SessionConfig::default())
    }

    /// Create a session for an authenticated user.
    ///
    /// Persists the record with TTL = configured lifetime and registers the
    /// id in the user's session set (whose TTL is refreshed to match).
    /// Returns `None` on store failure.
    pub async fn create_session(&self, input: NewSession) -> Option<SessionRecord> {
        match self.try_create(input).await {
            Ok(record) => {
                debug!(user_id = %record.user_id, "session created");
                Some(record)
            }
            Err(e) => {
                warn!(error = %e, "failed to create session");
                None
            }
        }
    }

    async fn try_create(&self, input: NewSession) -> StoreResult<SessionRecord> {
        let now = OffsetDateTime::now_utc();
        let record = SessionRecord {
            session_id: generate_session_id(),
            user_id: input.user_id,
            role: input.role,
            tenant_id: input.tenant_id,
            user_type: input.user_type,
            email: input.email,
            display_name: input.display_name,
            permissions: input.permissions,
            created_at: now,
            last_activity_at: now,
            expires_at: now + self.config.lifetime,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
        };

        let key = keys::session(&record.session_id);
        self.store
            .set_ex(&key, &to_json(&record)?, self.config.lifetime)
            .await?;

        let set_key = keys::user_sessions(&record.user_id);
        self.store.set_add(&set_key, &record.session_id).await?;
        self.store.expire(&set_key, self.config.lifetime).await?;

        Ok(record)
    }

    /// Read a session, enforcing app-level expiry lazily.
    ///
    /// A record past its embedded `expires_at` is deleted and reported as
    /// absent even if the store TTL has not fired yet. A live record gets its
    /// `last_activity_at` refreshed and is rewritten with its remaining TTL.
    pub async fn get_session(&self, session_id: &str) -> Option<SessionRecord> {
        match self.try_get(session_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "failed to read session");
                None
            }
        }
    }

    async fn try_get(&self, session_id: &str) -> StoreResult<Option<SessionRecord>> {
        let key = keys::session(session_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let mut record: SessionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "dropping malformed session record");
                self.store.delete(&key).await?;
                return Ok(None);
            }
        };

        let now = OffsetDateTime::now_utc();
        if record.is_expired(now) {
            self.remove_session_keys(&record).await?;
            debug!(session_id = %record.session_id, "expired session removed on read");
            return Ok(None);
        }

        record.last_activity_at = now;
        let remaining = (record.expires_at - now).unsigned_abs();
        self.store.set_ex(&key, &to_json(&record)?, remaining).await?;

        Ok(Some(record))
    }

    /// Append an entry to the session's activity trail.
    ///
    /// The trail is a capped most-recent-first list with its own (longer)
    /// TTL, so it remains inspectable after the session ends. Returns `false`
    /// if the session no longer exists.
    pub async fn update_session_activity(
        &self,
        session_id: &str,
        action: &str,
        metadata: serde_json::Value,
    ) -> bool {
        match self.try_update_activity(session_id, action, metadata).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!(error = %e, "failed to record session activity");
                false
            }
        }
    }

    async fn try_update_activity(
        &self,
        session_id: &str,
        action: &str,
        metadata: serde_json::Value,
    ) -> StoreResult<bool> {
        if self.try_get(session_id).await?.is_none() {
            return Ok(false);
        }

        let entry = ActivityEntry {
            action: action.to_string(),
            metadata,
            timestamp: OffsetDateTime::now_utc(),
        };
        let key = keys::session_activity(session_id);
        self.store.list_push(&key, &to_json(&entry)?).await?;
        self.store
            .list_trim(&key, 0, self.config.activity_log_cap as isize - 1)
            .await?;
        self.store.expire(&key, self.config.activity_log_ttl).await?;
        Ok(true)
    }

    /// Read the session's activity trail, most recent first.
    ///
    /// Individual entries that fail to parse are skipped.
    pub async fn get_session_activity(&self, session_id: &str) -> Vec<ActivityEntry> {
        let key = keys::session_activity(session_id);
        match self.store.list_range(&key, 0, -1).await {
            Ok(raw) => raw
                .iter()
                .filter_map(|item| serde_json::from_str(item).ok())
                .collect(),
            Err(e) => {
                warn!(error = %e, "failed to read session activity");
                Vec::new()
            }
        }
    }

    /// Destroy one session: record, owner-set membership, activity trail.
    ///
    /// Returns `true` only if a session record was actually removed, so
    /// repeated destroys are idempotent and report `false`.
    pub async fn destroy_session(&self, session_id: &str) -> bool {
        match self.try_destroy(session_id).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, "failed to destroy session");
                false
            }
        }
    }

    async fn try_destroy(&self, session_id: &str) -> StoreResult<bool> {
        let key = keys::session(session_id);

        // Resolve the owner before deleting so the set membership can be
        // cleaned up too. A malformed record still gets its keys removed.
        let owner = match self.store.get(&key).await? {
            Some(raw) => serde_json::from_str::<SessionRecord>(&raw)
                .ok()
                .map(|record| record.user_id),
            None => None,
        };

        let removed = self.store.delete(&key).await?;
        if let Some(user_id) = owner {
            self.store
                .set_remove(&keys::user_sessions(&user_id), session_id)
                .await?;
        }
        self.store.delete(&keys::session_activity(session_id)).await?;

        if removed {
            debug!(session_id = %session_id, "session destroyed");
        }
        Ok(removed)
    }

    /// Destroy every session of one user (password change, compromise).
    ///
    /// Per-session deletions run concurrently; the user's session set is
    /// deleted afterwards.
    pub async fn destroy_all_user_sessions(&self, user_id: &str) -> bool {
        match self.try_destroy_all(user_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "failed to destroy user sessions");
                false
            }
        }
    }

    async fn try_destroy_all(&self, user_id: &str) -> StoreResult<()> {
        let set_key = keys::user_sessions(user_id);
        let ids = self.store.set_members(&set_key).await?;
        let count = ids.len();

        let results = join_all(ids.iter().map(|id| self.try_destroy(id))).await;
        for result in results {
            result?;
        }

        self.store.delete(&set_key).await?;
        debug!(user_id = %user_id, count, "destroyed all user sessions");
        Ok(())
    }

    /// All live sessions of a user.
    ///
    /// Ids that resolve to nothing (concurrent expiry) are filtered out; the
    /// result is a point-in-time approximation, not a consistent snapshot.
    pub async fn get_user_sessions(&self, user_id: &str) -> Vec<SessionRecord> {
        let set_key = keys::user_sessions(user_id);
        let ids = match self.store.set_members(&set_key).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "failed to list user sessions");
                return Vec::new();
            }
        };

        let fetched = join_all(ids.iter().map(|id| self.try_get(id))).await;
        fetched
            .into_iter()
            .filter_map(|result| result.ok().flatten())
            .collect()
    }

    /// Push the session's expiry to now + `hours`, with a matching fresh
    /// store TTL. The session id is not rotated.
    pub async fn extend_session(&self, session_id: &str, hours: u64) -> bool {
        match self.try_extend(session_id, hours).await {
            Ok(extended) => extended,
            Err(e) => {
                warn!(error = %e, "failed to extend session");
                false
            }
        }
    }

    async fn try_extend(&self, session_id: &str, hours: u64) -> StoreResult<bool> {
        let key = keys::session(session_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(false);
        };
        let Ok(mut record) = serde_json::from_str::<SessionRecord>(&raw) else {
            return Ok(false);
        };

        let lifetime = Duration::from_secs(hours * 3600);
        record.expires_at = OffsetDateTime::now_utc() + lifetime;
        self.store.set_ex(&key, &to_json(&record)?, lifetime).await?;
        Ok(true)
    }

    /// `get_session` plus an optional permission-set membership check.
    pub async fn validate_session(
        &self,
        session_id: &str,
        required_permission: Option<&str>,
    ) -> Option<SessionRecord> {
        let record = self.get_session(session_id).await?;
        if let Some(permission) = required_permission {
            if !record.permissions.iter().any(|p| p == permission) {
                debug!(session_id = %session_id, permission, "session lacks permission");
                return None;
            }
        }
        Some(record)
    }

    /// Maintenance sweep: delete every session record past its app-level
    /// expiry. Intended to be triggered periodically outside the request
    /// path; the store TTL usually gets there first, this catches records
    /// whose app-level deadline is shorter. Returns the number removed.
    pub async fn cleanup_expired_sessions(&self) -> u64 {
        match self.try_cleanup().await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, "session cleanup sweep failed");
                0
            }
        }
    }

    async fn try_cleanup(&self) -> StoreResult<u64> {
        let mut removed = 0u64;
        for key in self.store.scan_keys("session:*").await? {
            if key.ends_with(":activity") {
                continue;
            }
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };
            // Malformed records are skipped, not fatal to the sweep.
            let Ok(record) = serde_json::from_str::<SessionRecord>(&raw) else {
                continue;
            };
            if record.is_expired(OffsetDateTime::now_utc()) {
                self.remove_session_keys(&record).await?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "cleanup sweep removed expired sessions");
        }
        Ok(removed)
    }

    async fn remove_session_keys(&self, record: &SessionRecord) -> StoreResult<()> {
        self.store.delete(&keys::session(&record.session_id)).await?;
        self.store
            .set_remove(&keys::user_sessions(&record.user_id), &record.session_id)
            .await?;
        self.store
            .delete(&keys::session_activity(&record.session_id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        assert_eq!(id.len(), 64);
        assert!(hex::decode(&id).is_ok());
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
