//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, RawQuery, State},
    http::{HeaderMap, header},
    response::Redirect,
};
use std::net::SocketAddr;
use tokio::sync::mpsc::error::TrySendError;

use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Redirects a short code to the destination chosen for this visitor.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Identify the visitor by client address (proxy headers only when
///    `BEHIND_PROXY` is set)
/// 2. Resolve the short code and pick a variant or the primary target
/// 3. Forward inbound query parameters and add Google Forms prefill
/// 4. Queue a visit event for the background worker
/// 5. Return 307 Temporary Redirect
///
/// # Visit Tracking
///
/// Events go to a bounded channel. If the queue is full the visit is dropped
/// and counted in `visits_dropped_total`; the redirect is never delayed.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
) -> Result<Redirect, AppError> {
    let visitor = client_ip(&headers, addr, state.behind_proxy);
    let inbound = query_pairs(raw_query.as_deref());

    let decision = state
        .redirect_service
        .resolve(&code, &visitor, &inbound)
        .await?;

    let event = VisitEvent::new(
        decision.short_code,
        decision.short_url_id,
        decision.variant_id,
        decision.target_url,
        Some(visitor),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        headers.get(header::REFERER).and_then(|v| v.to_str().ok()),
    );

    metrics::counter!("redirects_total", "arm" => event.arm()).increment(1);

    match state.visit_sender.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(ev)) => {
            metrics::counter!("visits_dropped_total").increment(1);
            tracing::warn!(short_url_id = ev.short_url_id, "Visit queue full, visit dropped");
        }
        Err(TrySendError::Closed(ev)) => {
            metrics::counter!("visits_dropped_total").increment(1);
            tracing::error!(short_url_id = ev.short_url_id, "Visit queue closed, visit dropped");
        }
    }

    Ok(Redirect::temporary(&decision.location))
}
