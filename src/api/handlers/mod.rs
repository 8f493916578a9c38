//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod auth;
pub mod health;
pub mod redirect;
pub mod variants;

pub use auth::{login_handler, logout_handler};
pub use health::health_handler;
pub use redirect::redirect_handler;
pub use variants::{
    create_variant_handler, delete_variant_handler, list_variants_handler,
    update_variant_handler,
};
