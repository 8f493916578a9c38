//! Business logic services for the application layer.

pub mod auth_service;
pub mod redirect_service;
pub mod variant_service;

pub use auth_service::{AuthService, IssuedSession, SessionClaims};
pub use redirect_service::{ChosenTarget, RedirectDecision, RedirectService};
pub use variant_service::{Allocation, VariantService};
