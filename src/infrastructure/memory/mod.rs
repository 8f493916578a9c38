//! In-process repository implementations.
//!
//! Used by the integration tests and the service-level test suites.
//! [`MemoryVariantRepository`] enforces the probability budget with the same
//! per-short-URL exclusion as the PostgreSQL backend.

mod catalog;
mod variant_repository;
mod visit_repository;

pub use catalog::{MemoryFormRepository, MemoryShortUrlRepository};
pub use variant_repository::MemoryVariantRepository;
pub use visit_repository::MemoryVisitRepository;
