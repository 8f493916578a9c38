//! Redirect resolution: short code to final destination URL.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::ShortUrl;
use crate::domain::repositories::{FormRepository, ShortUrlRepository, VariantRepository};
use crate::domain::selector::{self, VisitorKey};
use crate::error::AppError;
use crate::utils::url_builder::{build_url, extract_form_id, form_prefill_params, is_google_form};

/// The destination chosen for one visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenTarget {
    pub target_url: String,
    /// `None` when the visitor goes to the primary destination.
    pub variant_id: Option<i64>,
}

/// Everything the redirect handler needs to answer and record a visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDecision {
    pub short_url_id: i64,
    pub short_code: String,
    pub variant_id: Option<i64>,
    /// The chosen target before forwarding and prefill.
    pub target_url: String,
    /// The URL sent in the `Location` header.
    pub location: String,
}

pub struct RedirectService<S, V, F>
where
    S: ShortUrlRepository + ?Sized,
    V: VariantRepository + ?Sized,
    F: FormRepository + ?Sized,
{
    short_urls: Arc<S>,
    variants: Arc<V>,
    forms: Arc<F>,
    click_id_max_age: u64,
}

impl<S, V, F> RedirectService<S, V, F>
where
    S: ShortUrlRepository + ?Sized,
    V: VariantRepository + ?Sized,
    F: FormRepository + ?Sized,
{
    pub fn new(short_urls: Arc<S>, variants: Arc<V>, forms: Arc<F>, click_id_max_age: u64) -> Self {
        Self {
            short_urls,
            variants,
            forms,
            click_id_max_age,
        }
    }

    /// Picks the destination of `client_addr` for a short URL.
    ///
    /// Deterministic: the same visitor gets the same answer as long as the
    /// active variants of the short URL are unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the variants cannot be loaded.
    pub async fn resolve_variant(
        &self,
        short_url: &ShortUrl,
        client_addr: &str,
    ) -> Result<ChosenTarget, AppError> {
        let primary = short_url.primary_target();
        let variants = self.variants.list_active(short_url.id).await?;

        let key = VisitorKey::new(&primary, client_addr);
        let selection = selector::select(&key, &variants, &primary);

        tracing::debug!(
            short_url_id = short_url.id,
            point = selection.point.ppm(),
            variant_id = ?selection.variant_id,
            "Variant selected"
        );

        Ok(ChosenTarget {
            target_url: selection.target.to_string(),
            variant_id: selection.variant_id,
        })
    }

    /// Resolves a short code to the URL the visitor is redirected to.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the short code is unknown.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn resolve(
        &self,
        short_code: &str,
        client_addr: &str,
        inbound: &[(String, String)],
    ) -> Result<RedirectDecision, AppError> {
        let short_url = self
            .short_urls
            .find_by_code(short_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Short URL not found", json!({ "code": short_code }))
            })?;

        let chosen = self.resolve_variant(&short_url, client_addr).await?;
        let prefill = self.prefill(&short_url, &chosen.target_url, inbound).await;

        let location = build_url(&chosen.target_url, inbound, &prefill)
            .unwrap_or_else(|e| {
                tracing::warn!(
                    target_url = %chosen.target_url,
                    error = %e,
                    "Target is not an absolute URL, redirecting without parameters"
                );
                chosen.target_url.clone()
            });

        Ok(RedirectDecision {
            short_url_id: short_url.id,
            short_code: short_url.short_code,
            variant_id: chosen.variant_id,
            target_url: chosen.target_url,
            location,
        })
    }

    /// Google Forms prefill parameters for `target`. Failures are logged and
    /// yield no parameters.
    async fn prefill(
        &self,
        short_url: &ShortUrl,
        target: &str,
        inbound: &[(String, String)],
    ) -> Vec<(String, String)> {
        if !is_google_form(target) {
            return Vec::new();
        }

        let Some(form_id) = extract_form_id(target) else {
            tracing::warn!(target_url = %target, "Could not extract form id");
            return Vec::new();
        };

        let fields = match self.forms.find_fields(form_id).await {
            Ok(Some(fields)) => fields,
            Ok(None) => {
                tracing::warn!(form_id, "Form field mapping not found");
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(form_id, error = %e, "Failed to load form field mapping");
                return Vec::new();
            }
        };

        let last_visit = match self.short_urls.latest_visit(short_url.id).await {
            Ok(visit) => visit,
            Err(e) => {
                tracing::error!(short_url_id = short_url.id, error = %e, "Failed to load last visit");
                None
            }
        };

        form_prefill_params(
            &fields,
            inbound,
            last_visit.as_ref(),
            Utc::now(),
            self.click_id_max_age,
        )
    }
}
