//! Handlers for admin login and logout.

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
};
use chrono::DateTime;
use serde_json::json;
use validator::Validate;

use crate::api::dto::auth::{LoginRequest, LoginResponse};
use crate::api::middleware::auth::AdminSession;
use crate::error::AppError;
use crate::state::AppState;

const COOKIE_PATH: &str = "/admin";

fn session_cookie(name: &str, value: &str, max_age: u64) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!(
        "{name}={value}; Path={COOKIE_PATH}; Max-Age={max_age}; HttpOnly; SameSite=Strict"
    ))
    .map_err(|_| AppError::internal("Failed to build session cookie", json!({})))
}

/// Exchanges the admin token for a session.
///
/// # Endpoint
///
/// `POST /admin/login`
///
/// # Request Body
///
/// ```json
/// { "token": "<ADMIN_TOKEN>" }
/// ```
///
/// The session token is returned in the body and set as an `HttpOnly`,
/// `SameSite=Strict` cookie scoped to `/admin`.
///
/// # Errors
///
/// Returns 401 if the admin token is wrong.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), AppError> {
    payload.validate()?;

    let session = state.auth_service.login(&payload.token)?;
    let expires_at = DateTime::from_timestamp(session.claims.exp, 0)
        .ok_or_else(|| AppError::internal("Invalid session expiry", json!({})))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(
            &state.session_cookie_name,
            &session.token,
            state.auth_service.max_age(),
        )?,
    );

    Ok((
        headers,
        Json(LoginResponse {
            token: session.token,
            expires_at,
        }),
    ))
}

/// Revokes the current session and clears the cookie.
///
/// # Endpoint
///
/// `POST /admin/logout`
///
/// The revocation is shared by every instance using the same session store,
/// so the token stops working everywhere before its expiry.
///
/// # Errors
///
/// Returns 500 if the revocation cannot be stored.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Result<(StatusCode, HeaderMap), AppError> {
    state.auth_service.logout(&session.token).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(&state.session_cookie_name, "", 0)?,
    );

    Ok((StatusCode::NO_CONTENT, headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("admin_session", "abc.def", 3600).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "admin_session=abc.def; Path=/admin; Max-Age=3600; HttpOnly; SameSite=Strict"
        );
    }
}
