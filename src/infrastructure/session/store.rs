//! Revocation store trait and error types.

use async_trait::async_trait;

/// Errors raised by a revocation store backend.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session store connection error: {0}")]
    Connection(String),

    #[error("Session store operation error: {0}")]
    Operation(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Remembers revoked session ids until their expiry.
///
/// Unlike a cache, a store must not fail open: an error from
/// [`RevocationStore::is_revoked`] has to reject the request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Marks `jti` as revoked for `ttl_seconds`.
    async fn revoke(&self, jti: &str, ttl_seconds: u64) -> SessionResult<()>;

    /// Returns true if `jti` has been revoked and the entry has not expired.
    async fn is_revoked(&self, jti: &str) -> SessionResult<bool>;

    /// Checks if the backend is reachable.
    async fn health_check(&self) -> bool;

    /// Short backend name for health reports.
    fn backend(&self) -> &'static str;
}
