//! Repository trait for redirect visit recording.

use crate::domain::entities::{NewRedirectVisit, RedirectVisit};
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Persists one served redirect.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn record(&self, visit: NewRedirectVisit) -> Result<RedirectVisit, AppError>;
}
