//! Admin authentication: credential check and stateless session tokens.
//!
//! A session token is `base64url(claims) "." base64url(HMAC-SHA256(secret, base64url(claims)))`.
//! Verification needs only the secret, plus a revocation lookup by `jti`, so
//! any instance sharing the secret and the revocation store accepts it.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;

use crate::error::AppError;
use crate::infrastructure::session::RevocationStore;

type HmacSha256 = Hmac<Sha256>;

const SUBJECT: &str = "admin";

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Unique token id, used for revocation.
    pub jti: String,
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

fn unauthorized(reason: &str) -> AppError {
    AppError::unauthorized("Unauthorized", json!({ "reason": reason }))
}

/// Service for admin login, session verification and logout.
pub struct AuthService<R: RevocationStore + ?Sized> {
    store: Arc<R>,
    secret: Vec<u8>,
    admin_token_mac: Vec<u8>,
    max_age: u64,
}

impl<R: RevocationStore + ?Sized> AuthService<R> {
    /// Creates the service.
    ///
    /// - `admin_token` - the shared admin credential accepted by [`Self::login`]
    /// - `secret` - HMAC key for session tokens
    /// - `max_age` - session lifetime in seconds
    pub fn new(store: Arc<R>, admin_token: &str, secret: &str, max_age: u64) -> Self {
        let mut service = Self {
            store,
            secret: secret.as_bytes().to_vec(),
            admin_token_mac: Vec::new(),
            max_age,
        };
        service.admin_token_mac = service.sign(admin_token.as_bytes());
        service
    }

    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    /// Short name of the revocation backend.
    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn store_healthy(&self) -> bool {
        self.store.health_check().await
    }

    fn mac(&self) -> HmacSha256 {
        match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
        }
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    fn verify_signature(&self, data: &[u8], signature: &[u8]) -> bool {
        let mut mac = self.mac();
        mac.update(data);
        mac.verify_slice(signature).is_ok()
    }

    /// Exchanges the admin credential for a session.
    ///
    /// The credential is compared in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the credential is wrong.
    pub fn login(&self, admin_token: &str) -> Result<IssuedSession, AppError> {
        if !self.verify_signature(admin_token.as_bytes(), &self.admin_token_mac) {
            tracing::warn!("Admin login rejected");
            return Err(unauthorized("Invalid admin token"));
        }

        let session = self.issue_at(Utc::now().timestamp())?;
        tracing::info!(jti = %session.claims.jti, "Admin session issued");
        Ok(session)
    }

    /// Issues a session token valid from `now` for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the claims cannot be serialized.
    pub fn issue_at(&self, now: i64) -> Result<IssuedSession, AppError> {
        let claims = SessionClaims {
            sub: SUBJECT.to_string(),
            iat: now,
            exp: now.saturating_add(i64::try_from(self.max_age).unwrap_or(i64::MAX)),
            jti: format!("{:032x}", rand::random::<u128>()),
        };

        let payload = serde_json::to_vec(&claims).map_err(|e| {
            AppError::internal("Failed to encode session", json!({ "reason": e.to_string() }))
        })?;
        let payload = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));

        Ok(IssuedSession {
            token: format!("{payload}.{signature}"),
            claims,
        })
    }

    /// Verifies a session token against the current time.
    ///
    /// # Errors
    ///
    /// See [`Self::verify_at`].
    pub async fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        self.verify_at(token, Utc::now().timestamp()).await
    }

    /// Verifies signature, expiry and revocation of a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for malformed, forged, expired or
    /// revoked tokens.
    /// Returns [`AppError::Internal`] if the revocation store cannot be queried.
    pub async fn verify_at(&self, token: &str, now: i64) -> Result<SessionClaims, AppError> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| unauthorized("Malformed session token"))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| unauthorized("Malformed session token"))?;
        if !self.verify_signature(payload.as_bytes(), &signature) {
            return Err(unauthorized("Invalid session signature"));
        }

        let claims: SessionClaims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| unauthorized("Malformed session token"))?;

        if claims.sub != SUBJECT {
            return Err(unauthorized("Invalid session subject"));
        }
        if claims.exp <= now {
            return Err(unauthorized("Session expired"));
        }

        let revoked = self.store.is_revoked(&claims.jti).await.map_err(|e| {
            tracing::error!(error = %e, "Revocation lookup failed");
            AppError::internal("Session store unavailable", json!({}))
        })?;
        if revoked {
            return Err(unauthorized("Session revoked"));
        }

        Ok(claims)
    }

    /// Revokes a session until its natural expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is not a valid session.
    /// Returns [`AppError::Internal`] if the revocation cannot be stored.
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        let now = Utc::now().timestamp();
        let claims = self.verify_at(token, now).await?;
        let ttl = u64::try_from(claims.exp - now).unwrap_or(1);

        self.store.revoke(&claims.jti, ttl).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to revoke session");
            AppError::internal("Session store unavailable", json!({}))
        })?;

        tracing::info!(jti = %claims.jti, "Admin session revoked");
        Ok(())
    }
}
