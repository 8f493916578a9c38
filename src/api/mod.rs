//! HTTP layer: the public redirect, the admin JSON API and health.
//!
//! - [`dto`] - request/response bodies
//! - [`handlers`] - axum handlers
//! - [`middleware`] - session auth, rate limiting, tracing
//! - [`routes`] - admin route tables

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
