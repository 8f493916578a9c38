//! Repository trait for variant storage.

use crate::domain::entities::{NewVariant, Variant, VariantPatch};
use crate::domain::probability::Probability;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the variants of all short URLs.
///
/// Implementations own the probability budget invariant: `create` and `update`
/// must read the sibling variants, validate with [`crate::domain::ledger`] and
/// write, all under one per-short-URL mutual exclusion scope. Mutations of
/// different short URLs must not block each other.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgVariantRepository`] - PostgreSQL, advisory locks
/// - [`crate::infrastructure::memory::MemoryVariantRepository`] - In-process, per-code mutexes
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VariantRepository: Send + Sync {
    /// Lists every variant of a short URL, active or not, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list_by_short_url(&self, short_url_id: i64) -> Result<Vec<Variant>, AppError>;

    /// Lists the active variants of a short URL in creation order.
    ///
    /// This order defines the selector's cut-points and must be identical
    /// across calls absent mutation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list_active(&self, short_url_id: i64) -> Result<Vec<Variant>, AppError>;

    /// Finds a variant by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Variant>, AppError>;

    /// Creates a variant after validating it against its siblings.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the probability budget would be exceeded
    /// or the input is malformed.
    /// Returns [`AppError::Internal`] on storage errors (including timeouts).
    async fn create(&self, new_variant: NewVariant) -> Result<Variant, AppError>;

    /// Partially updates a variant, re-validating the budget.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no variant has this id.
    /// Returns [`AppError::Validation`] if the updated state would exceed the budget.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn update(&self, id: i64, patch: VariantPatch) -> Result<Variant, AppError>;

    /// Deletes a variant.
    ///
    /// Returns `Ok(true)` if it existed, `Ok(false)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Sum of the active probabilities of a short URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn total_active_probability(&self, short_url_id: i64) -> Result<Probability, AppError>;
}
