//! Session record types.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Which population an authenticated user belongs to.
///
/// Serialized in the wire format the platform already stores
/// (`TENANT_USER` etc.), so existing session records keep deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    /// A user scoped to one SPPG tenant (kitchen/unit operator).
    TenantUser,
    /// A platform-level user (superadmin, support) with no tenant scope.
    PlatformUser,
    /// A throwaway demo account.
    DemoUser,
}

/// One authenticated browser session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque random token, unique per session.
    pub session_id: String,
    pub user_id: String,
    pub role: String,
    /// `None` for platform/demo users that are not tenant-scoped.
    pub tenant_id: Option<String>,
    pub user_type: UserType,
    pub email: String,
    pub display_name: String,
    /// Flat permission strings checked by `validate_session`.
    pub permissions: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity_at: OffsetDateTime,
    /// App-level expiry; authoritative over the store TTL.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl SessionRecord {
    /// Whether the app-level expiry has passed.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

/// Input for [`SessionManager::create_session`](crate::SessionManager::create_session).
///
/// The manager fills in the id and the timestamps.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub role: String,
    pub tenant_id: Option<String>,
    pub user_type: UserType,
    pub email: String,
    pub display_name: String,
    pub permissions: Vec<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One entry in a session's activity trail.
///
/// The trail lives in its own capped list with a TTL decoupled from the
/// session record, so it survives the session for audit purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub action: String,
    /// Caller-shaped context (page, entity id, ...); opaque to this layer.
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&UserType::TenantUser).unwrap(),
            "\"TENANT_USER\""
        );
        assert_eq!(
            serde_json::from_str::<UserType>("\"PLATFORM_USER\"").unwrap(),
            UserType::PlatformUser
        );
    }

    #[test]
    fn test_session_record_roundtrip() {
        let now = OffsetDateTime::now_utc();
        let record = SessionRecord {
            session_id: "abc".into(),
            user_id: "u1".into(),
            role: "admin".into(),
            tenant_id: Some("t1".into()),
            user_type: UserType::TenantUser,
            email: "a@b.c".into(),
            display_name: "A".into(),
            permissions: vec!["menus:read".into()],
            created_at: now,
            last_activity_at: now,
            expires_at: now,
            ip_address: None,
            user_agent: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        // Optional client fields are omitted, not null.
        assert!(!json.contains("ip_address"));
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.session_id, "abc");
        assert_eq!(back.tenant_id.as_deref(), Some("t1"));
    }
}
