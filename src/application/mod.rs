//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::variant_service::VariantService`] - Variant creation, editing and budget reporting
//! - [`services::redirect_service::RedirectService`] - Variant resolution and redirect URL building
//! - [`services::auth_service::AuthService`] - Admin login and session tokens

pub mod services;
