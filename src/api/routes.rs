//! Admin route configuration.
//!
//! Everything except login requires a session via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    create_variant_handler, delete_variant_handler, list_variants_handler, login_handler,
    logout_handler, update_variant_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Routes reachable without a session.
///
/// - `POST /login` - Exchange the admin token for a session
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/login", post(login_handler))
}

/// Admin routes, protected by session authentication.
///
/// # Endpoints
///
/// - `POST   /logout`                    - Revoke the current session
/// - `GET    /short-urls/{id}/variants`  - List variants with budget usage
/// - `POST   /short-urls/{id}/variants`  - Add a variant
/// - `PATCH  /variants/{id}`             - Partially update a variant
/// - `DELETE /variants/{id}`             - Delete a variant
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout_handler))
        .route(
            "/short-urls/{id}/variants",
            get(list_variants_handler).post(create_variant_handler),
        )
        .route(
            "/variants/{id}",
            patch(update_variant_handler).delete(delete_variant_handler),
        )
}
