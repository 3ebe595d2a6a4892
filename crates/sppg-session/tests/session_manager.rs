//! Session manager integration tests against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use sppg_kv::{KeyValueStore, MemoryStore, UnavailableStore};
use sppg_session::{NewSession, SessionConfig, SessionManager, UserType};

fn input(user_id: &str) -> NewSession {
    NewSession {
        user_id: user_id.to_string(),
        role: "kitchen-admin".to_string(),
        tenant_id: Some("sppg-bandung-01".to_string()),
        user_type: UserType::TenantUser,
        email: format!("{user_id}@sppg.example"),
        display_name: "Test User".to_string(),
        permissions: vec!["menus:read".to_string(), "productions:write".to_string()],
        ip_address: Some("10.0.0.1".to_string()),
        user_agent: Some("integration-test".to_string()),
    }
}

fn manager(store: Arc<MemoryStore>) -> SessionManager {
    SessionManager::with_defaults(store)
}

/// Short app-level lifetime; the store TTL (whole-second floor) outlives it,
/// so reads exercise the lazy app-level expiry path.
fn short_lived(store: Arc<MemoryStore>) -> SessionManager {
    SessionManager::new(
        store,
        SessionConfig {
            lifetime: Duration::from_millis(200),
            ..SessionConfig::default()
        },
    )
}

#[tokio::test]
async fn test_unknown_session_id_resolves_to_none() {
    let mgr = manager(Arc::new(MemoryStore::new()));
    assert!(mgr.get_session("deadbeef").await.is_none());
}

#[tokio::test]
async fn test_create_then_get_roundtrip() {
    let mgr = manager(Arc::new(MemoryStore::new()));
    let record = mgr.create_session(input("u1")).await.unwrap();

    let fetched = mgr.get_session(&record.session_id).await.unwrap();
    assert_eq!(fetched.user_id, "u1");
    assert_eq!(fetched.role, "kitchen-admin");
    assert_eq!(fetched.tenant_id.as_deref(), Some("sppg-bandung-01"));
    assert!(fetched.last_activity_at >= record.last_activity_at);
}

#[tokio::test]
async fn test_expired_session_is_removed_on_read() {
    let store = Arc::new(MemoryStore::new());
    let mgr = short_lived(store.clone());
    let record = mgr.create_session(input("u1")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    // App-level expiry has passed even though the store TTL has not.
    assert!(mgr.get_session(&record.session_id).await.is_none());

    // The record is gone for good, and the user's set no longer lists it.
    let raw = store
        .get(&format!("session:{}", record.session_id))
        .await
        .unwrap();
    assert!(raw.is_none());
    let members = store
        .set_members(&format!("user-sessions:{}", record.user_id))
        .await
        .unwrap();
    assert!(!members.contains(&record.session_id));
}

#[tokio::test]
async fn test_destroy_session_removes_everything() {
    let store = Arc::new(MemoryStore::new());
    let mgr = manager(store.clone());
    let record = mgr.create_session(input("u1")).await.unwrap();
    mgr.update_session_activity(&record.session_id, "login", serde_json::json!({}))
        .await;

    assert!(mgr.destroy_session(&record.session_id).await);
    assert!(mgr.get_session(&record.session_id).await.is_none());

    let members = store.set_members("user-sessions:u1").await.unwrap();
    assert!(!members.contains(&record.session_id));
    assert!(mgr.get_session_activity(&record.session_id).await.is_empty());

    // Destroying again reports false.
    assert!(!mgr.destroy_session(&record.session_id).await);
}

#[tokio::test]
async fn test_bulk_revocation_end_to_end() {
    let mgr = manager(Arc::new(MemoryStore::new()));
    let first = mgr.create_session(input("u7")).await.unwrap();
    let _second = mgr.create_session(input("u7")).await.unwrap();
    let other = mgr.create_session(input("u8")).await.unwrap();

    let fetched = mgr.get_session(&first.session_id).await.unwrap();
    assert_eq!(fetched.user_id, "u7");

    assert_eq!(mgr.get_user_sessions("u7").await.len(), 2);
    assert!(mgr.destroy_all_user_sessions("u7").await);
    assert!(mgr.get_user_sessions("u7").await.is_empty());

    // Another user's sessions are untouched.
    assert!(mgr.get_session(&other.session_id).await.is_some());
}

#[tokio::test]
async fn test_extend_session_pushes_expiry_forward() {
    let store = Arc::new(MemoryStore::new());
    let mgr = short_lived(store);
    let record = mgr.create_session(input("u1")).await.unwrap();

    assert!(mgr.extend_session(&record.session_id, 1).await);
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Would have expired under the original 200ms lifetime.
    let fetched = mgr.get_session(&record.session_id).await.unwrap();
    assert!(fetched.expires_at > record.expires_at);

    assert!(!mgr.extend_session("unknown", 1).await);
}

#[tokio::test]
async fn test_validate_session_checks_permissions() {
    let mgr = manager(Arc::new(MemoryStore::new()));
    let record = mgr.create_session(input("u1")).await.unwrap();

    assert!(mgr.validate_session(&record.session_id, None).await.is_some());
    assert!(
        mgr.validate_session(&record.session_id, Some("menus:read"))
            .await
            .is_some()
    );
    assert!(
        mgr.validate_session(&record.session_id, Some("payroll:write"))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_activity_trail_is_capped_and_ordered() {
    let store = Arc::new(MemoryStore::new());
    let mgr = SessionManager::new(
        store,
        SessionConfig {
            activity_log_cap: 3,
            ..SessionConfig::default()
        },
    );
    let record = mgr.create_session(input("u1")).await.unwrap();

    for i in 0..5 {
        let ok = mgr
            .update_session_activity(
                &record.session_id,
                "page-view",
                serde_json::json!({"seq": i}),
            )
            .await;
        assert!(ok);
    }

    let trail = mgr.get_session_activity(&record.session_id).await;
    assert_eq!(trail.len(), 3);
    // Most recent first.
    assert_eq!(trail[0].metadata["seq"], 4);
    assert_eq!(trail[2].metadata["seq"], 2);
}

#[tokio::test]
async fn test_activity_on_missing_session_is_rejected() {
    let mgr = manager(Arc::new(MemoryStore::new()));
    let ok = mgr
        .update_session_activity("ghost", "page-view", serde_json::json!({}))
        .await;
    assert!(!ok);
}

#[tokio::test]
async fn test_malformed_record_reads_as_absent() {
    let store = Arc::new(MemoryStore::new());
    store
        .set_ex("session:broken", "{not json", Duration::from_secs(60))
        .await
        .unwrap();

    let mgr = manager(store.clone());
    assert!(mgr.get_session("broken").await.is_none());
    // The broken record was dropped, not left to fail every read.
    assert!(store.get("session:broken").await.unwrap().is_none());
}

#[tokio::test]
async fn test_store_outage_degrades_to_defaults() {
    let mgr = SessionManager::with_defaults(Arc::new(UnavailableStore));

    assert!(mgr.create_session(input("u1")).await.is_none());
    assert!(mgr.get_session("any").await.is_none());
    assert!(!mgr.destroy_session("any").await);
    assert!(mgr.get_user_sessions("u1").await.is_empty());
    assert_eq!(mgr.cleanup_expired_sessions().await, 0);
}

#[tokio::test]
async fn test_cleanup_sweep_removes_only_expired() {
    let store = Arc::new(MemoryStore::new());
    let short = short_lived(store.clone());
    let long = manager(store.clone());

    let stale = short.create_session(input("u1")).await.unwrap();
    let live = long.create_session(input("u2")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(long.cleanup_expired_sessions().await, 1);

    assert!(store
        .get(&format!("session:{}", stale.session_id))
        .await
        .unwrap()
        .is_none());
    assert!(long.get_session(&live.session_id).await.is_some());
}
