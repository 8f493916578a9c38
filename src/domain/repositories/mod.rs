//! Repository trait definitions for the domain layer.
//!
//! This module defines the repository interfaces (traits) that abstract data access
//! operations following the Repository pattern. These traits are implemented by
//! concrete repositories in the infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence` (PostgreSQL)
//!   and `crate::infrastructure::memory` (in-process)
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`VariantRepository`] - Variant storage enforcing the probability budget
//! - [`ShortUrlRepository`] - Read-only access to the upstream short URL catalog
//! - [`FormRepository`] - Google Forms field mappings
//! - [`VisitRepository`] - Redirect visit recording

pub mod form_repository;
pub mod short_url_repository;
pub mod variant_repository;
pub mod visit_repository;

pub use form_repository::FormRepository;
pub use short_url_repository::ShortUrlRepository;
pub use variant_repository::VariantRepository;
pub use visit_repository::VisitRepository;

#[cfg(test)]
pub use form_repository::MockFormRepository;
#[cfg(test)]
pub use short_url_repository::MockShortUrlRepository;
#[cfg(test)]
pub use variant_repository::MockVariantRepository;
#[cfg(test)]
pub use visit_repository::MockVisitRepository;
