//! Login security guard for the SPPG platform.
//!
//! Defense-in-depth services around authentication, all over the shared
//! key-value store:
//!
//! - per-identifier login-attempt tracking with trailing-window lockout
//! - fixed-window request rate limiting
//! - Argon2id password hashing and a fixed password policy
//! - capped per-user security audit trail
//!
//! Availability is prioritized over strict enforcement: a store outage makes
//! every check permissive (rate limit allows, lockout reads as unlocked) and
//! is logged, never surfaced as an error. This layer is not a hard security
//! boundary; it throttles abuse in the common case.
//!
//! # Key layout
//!
//! - `security:attempts:{identifier}` — capped most-recent-first attempt list
//! - `security:lockout:{identifier}` — active lockout record, TTL-bound
//! - `security:ratelimit:{identifier}` — current rate-limit window
//! - `security:audit:{userId}` — capped audit event list

pub mod config;
pub mod guard;
pub mod keys;
pub mod password;
pub mod types;

pub use config::{PasswordPolicy, SecurityConfig};
pub use guard::SecurityGuard;
pub use password::{hash_password, validate_password, verify_password};
pub use types::{
    AttemptKind, AuditEvent, LockoutRecord, LoginAttempt, PasswordValidation, RateLimitDecision,
    RateLimitWindow,
};
