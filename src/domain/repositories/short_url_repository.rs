//! Repository trait for the upstream short URL catalog.

use crate::domain::entities::{ShortUrl, UpstreamVisit};
use crate::error::AppError;
use async_trait::async_trait;

/// Read-only access to the shortener's `short_urls` and `visits` tables.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortUrlRepository: Send + Sync {
    /// Finds a domain-less short URL by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortUrl>, AppError>;

    /// Finds a short URL by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<ShortUrl>, AppError>;

    /// Returns the most recent upstream visit of a short URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn latest_visit(&self, short_url_id: i64) -> Result<Option<UpstreamVisit>, AppError>;

    /// Checks that the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if it is not.
    async fn health_check(&self) -> Result<(), AppError>;
}
