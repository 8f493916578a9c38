//! Repository trait for Google Forms field mappings.

use crate::domain::entities::FormFields;
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormRepository: Send + Sync {
    /// Finds the field mapping of a form by either its edit id or its responder id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_fields(&self, form_id: &str) -> Result<Option<FormFields>, AppError>;
}
