//! PostgreSQL repository implementations.
//!
//! Concrete implementations of the domain repository traits using SQLx.
//! Queries are checked at runtime and mapped through `sqlx::FromRow` row types.
//!
//! # Repositories
//!
//! - [`PgVariantRepository`] - Variant storage with advisory-lock budget enforcement
//! - [`PgShortUrlRepository`] - Read-only upstream short URL catalog
//! - [`PgFormRepository`] - Google Forms field mappings
//! - [`PgVisitRepository`] - Redirect visit log

pub mod pg_form_repository;
pub mod pg_short_url_repository;
pub mod pg_variant_repository;
pub mod pg_visit_repository;

pub use pg_form_repository::PgFormRepository;
pub use pg_short_url_repository::PgShortUrlRepository;
pub use pg_variant_repository::PgVariantRepository;
pub use pg_visit_repository::PgVisitRepository;
