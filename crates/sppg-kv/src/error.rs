//! Store adapter error types.

/// Errors that can occur while talking to the key-value store.
///
/// The platform services treat the store as best-effort-available: every
/// variant is expected to be caught at the service layer, logged, and turned
/// into a safe default rather than propagated to request handlers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to obtain a connection from the pool.
    #[error("Store pool error: {0}")]
    Pool(String),

    /// A store command failed (network error, wrong type, server error).
    #[error("Store command error: {0}")]
    Command(String),

    /// Stored bytes could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Creates a new `Pool` error.
    #[must_use]
    pub fn pool(message: impl Into<String>) -> Self {
        Self::Pool(message.into())
    }

    /// Creates a new `Command` error.
    #[must_use]
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command(message.into())
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}
