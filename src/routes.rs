//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`   - Short link redirect (public)
//! - `GET  /health`   - Health check: DB, visit queue, session store (public, rate limited)
//!
//! `/health` is a static route and wins over `/{code}`, so an upstream short
//! code `health` is never redirected here. Admin routes all live below
//! `/admin/` and do not shadow any code.
//! - `/admin/login`   - Session login (public, strict rate limit)
//! - `/admin/*`       - Variant management (session required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on the admin surface
//! - **Authentication** - Session token as Bearer header or cookie
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// The admin router without rate limiting, mounted under `/admin` by
/// [`app_router`].
pub fn admin_router(state: AppState) -> Router<AppState> {
    let protected = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state, auth::layer));

    api::routes::public_routes().merge(protected)
}

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(service_router(state, behind_proxy))
}

/// All routes and middleware of [`app_router`] without path normalization.
pub fn service_router(state: AppState, behind_proxy: bool) -> Router {
    let admin = admin_router(state.clone()).layer(rate_limit::secure_layer(behind_proxy));
    let health = Router::new()
        .route("/health", get(health_handler))
        .layer(rate_limit::layer(behind_proxy));

    Router::new()
        .route("/{code}", get(redirect_handler))
        .merge(health)
        .nest("/admin", admin)
        .with_state(state)
        .layer(tracing::layer())
}
