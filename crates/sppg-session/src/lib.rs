//! Session management for the SPPG platform.
//!
//! Sessions are opaque random tokens mapped to [`SessionRecord`]s in the
//! shared key-value store, with a per-user session-id set enabling bulk
//! revocation (password change, suspected compromise). Expiry is enforced
//! twice: the store's native TTL is the backstop, and the app-level
//! `expires_at` embedded in the record is checked lazily on every read,
//! because a partial extension can leave the app-level deadline shorter than
//! the key's TTL.
//!
//! The session layer is best-effort-available by contract: every public
//! method catches store failures, logs them, and returns `None`/`false`/empty
//! instead of propagating. Callers must not treat it as a system of record.
//!
//! # Key layout
//!
//! Stable across reimplementations (existing stored data must keep working):
//!
//! - `session:{sessionId}` — JSON [`SessionRecord`], TTL = session lifetime
//! - `session:{sessionId}:activity` — capped JSON activity list, own TTL
//! - `user-sessions:{userId}` — set of live session ids for that user

pub mod config;
pub mod keys;
pub mod manager;
pub mod types;

pub use config::SessionConfig;
pub use manager::SessionManager;
pub use types::{ActivityEntry, NewSession, SessionRecord, UserType};
