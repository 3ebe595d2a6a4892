//! Store key builders for the session layer.
//!
//! The layout is persisted state; changing it orphans every live session.

/// `session:{sessionId}` — the JSON session record.
pub fn session(session_id: &str) -> String {
    format!("session:{session_id}")
}

/// `session:{sessionId}:activity` — capped activity list.
pub fn session_activity(session_id: &str) -> String {
    format!("session:{session_id}:activity")
}

/// `user-sessions:{userId}` — set of the user's live session ids.
pub fn user_sessions(user_id: &str) -> String {
    format!("user-sessions:{user_id}")
}
