//! Admin session authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::application::services::SessionClaims;
use crate::{error::AppError, state::AppState};

/// The verified session of the current request, available to handlers as an
/// `Extension` behind [`layer`].
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub token: String,
    pub claims: SessionClaims,
}

/// Reads a cookie value from the `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Extracts the session token from `Authorization: Bearer` or, failing that,
/// from the session cookie.
pub async fn session_token(parts: &mut Parts, cookie_name: &str) -> Option<String> {
    if let Ok(AuthBearer(token)) = AuthBearer::from_request_parts(parts, &()).await {
        return Some(token);
    }

    cookie_value(&parts.headers, cookie_name).map(str::to_string)
}

/// Authenticates admin requests with a session token.
///
/// # Token Sources
///
/// ```text
/// Authorization: Bearer <session>
/// Cookie: admin_session=<session>
/// ```
///
/// The header wins when both are present. The cookie name comes from
/// `SESSION_COOKIE_NAME`.
///
/// # Errors
///
/// Returns `401 Unauthorized` (with `WWW-Authenticate: Bearer`) if no token is
/// present or the token is malformed, forged, expired or revoked.
/// Returns `500` if the revocation store cannot be queried.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let token = session_token(&mut parts, &st.session_cookie_name)
        .await
        .ok_or_else(|| {
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "Session token is missing"}),
            )
        })?;

    let claims = st.auth_service.verify(&token).await?;
    tracing::debug!(jti = %claims.jti, "Admin session accepted");

    parts.extensions.insert(AdminSession { token, claims });
    let req = Request::from_parts(parts, body);

    Ok(next.run(req).await)
}
