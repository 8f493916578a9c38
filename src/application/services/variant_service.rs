//! Weight ledger operations: creating, editing and listing variants.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::{NewVariant, Variant, VariantPatch};
use crate::domain::probability::Probability;
use crate::domain::repositories::{ShortUrlRepository, VariantRepository};
use crate::error::AppError;
use crate::utils::url_normalizer::normalize_target;

/// Budget usage of one short URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub allocated: Probability,
    pub remaining: Probability,
}

impl Allocation {
    pub fn from_allocated(allocated: Probability) -> Self {
        Self {
            allocated,
            remaining: allocated.remaining(),
        }
    }
}

/// Service for managing the variants of short URLs.
///
/// Targets are normalized here; the budget itself is enforced by the
/// repository under its per-short-URL lock, so two concurrent mutations can
/// never both pass the check against the same stale sum.
pub struct VariantService<V, S>
where
    V: VariantRepository + ?Sized,
    S: ShortUrlRepository + ?Sized,
{
    variants: Arc<V>,
    short_urls: Arc<S>,
}

impl<V, S> VariantService<V, S>
where
    V: VariantRepository + ?Sized,
    S: ShortUrlRepository + ?Sized,
{
    pub fn new(variants: Arc<V>, short_urls: Arc<S>) -> Self {
        Self {
            variants,
            short_urls,
        }
    }

    async fn ensure_short_url(&self, short_url_id: i64) -> Result<(), AppError> {
        self.short_urls
            .find_by_id(short_url_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                AppError::not_found(
                    "Short URL not found",
                    json!({ "short_url_id": short_url_id }),
                )
            })
    }

    /// Adds a variant to a short URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the target is not an http(s) URL or
    /// the active sum would exceed `1.0`.
    /// Returns [`AppError::NotFound`] if the short URL does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn create(
        &self,
        short_url_id: i64,
        target_url: &str,
        probability: Probability,
        is_active: bool,
    ) -> Result<Variant, AppError> {
        let target_url = normalize_target(target_url)?;
        self.ensure_short_url(short_url_id).await?;

        let variant = self
            .variants
            .create(NewVariant {
                short_url_id,
                target_url,
                probability,
                is_active,
            })
            .await?;

        metrics::counter!("variant_mutations_total", "op" => "create").increment(1);
        tracing::info!(
            short_url_id,
            variant_id = variant.id,
            probability = %variant.probability,
            is_active = variant.is_active,
            "Variant created"
        );

        Ok(variant)
    }

    /// Partially updates a variant.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the patch is empty, the target is
    /// invalid or the resulting state would exceed the budget.
    /// Returns [`AppError::NotFound`] if the variant does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn update(&self, id: i64, mut patch: VariantPatch) -> Result<Variant, AppError> {
        if patch.is_empty() {
            return Err(AppError::bad_request(
                "No fields to update",
                json!({ "variant_id": id }),
            ));
        }

        if let Some(target_url) = patch.target_url.take() {
            patch.target_url = Some(normalize_target(&target_url)?);
        }

        let variant = self.variants.update(id, patch).await?;

        metrics::counter!("variant_mutations_total", "op" => "update").increment(1);
        tracing::info!(
            short_url_id = variant.short_url_id,
            variant_id = id,
            probability = %variant.probability,
            is_active = variant.is_active,
            "Variant updated"
        );

        Ok(variant)
    }

    /// Deletes a variant, freeing its share of the budget.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the variant does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !self.variants.delete(id).await? {
            return Err(AppError::not_found(
                "Variant not found",
                json!({ "variant_id": id }),
            ));
        }

        metrics::counter!("variant_mutations_total", "op" => "delete").increment(1);
        tracing::info!(variant_id = id, "Variant deleted");
        Ok(())
    }

    /// Finds a variant by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the variant does not exist.
    pub async fn get(&self, id: i64) -> Result<Variant, AppError> {
        self.variants
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Variant not found", json!({ "variant_id": id })))
    }

    /// Lists all variants of a short URL, active or not, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the short URL does not exist.
    pub async fn list_all(&self, short_url_id: i64) -> Result<Vec<Variant>, AppError> {
        self.ensure_short_url(short_url_id).await?;
        self.variants.list_by_short_url(short_url_id).await
    }

    /// Lists the active variants of a short URL in selection order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn list_active(&self, short_url_id: i64) -> Result<Vec<Variant>, AppError> {
        self.variants.list_active(short_url_id).await
    }

    /// Sum of the active probabilities of a short URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn total_active_probability(&self, short_url_id: i64) -> Result<Probability, AppError> {
        self.variants.total_active_probability(short_url_id).await
    }

    /// Allocated and remaining budget of a short URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn allocation(&self, short_url_id: i64) -> Result<Allocation, AppError> {
        let allocated = self.total_active_probability(short_url_id).await?;
        Ok(Allocation::from_allocated(allocated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ShortUrl;
    use crate::domain::ledger::LedgerError;
    use crate::domain::repositories::{MockShortUrlRepository, MockVariantRepository};
    use chrono::Utc;

    fn p(value: f64) -> Probability {
        Probability::from_f64(value).unwrap()
    }

    fn short_url(id: i64) -> ShortUrl {
        ShortUrl {
            id,
            short_code: "promo".to_string(),
            original_url: "https://landing.example.com/".to_string(),
            title: None,
            domain_id: None,
            forward_query: true,
            date_created: Utc::now(),
        }
    }

    fn variant_from(id: i64, nv: NewVariant) -> Variant {
        let now = Utc::now();
        Variant::new(
            id,
            nv.short_url_id,
            nv.target_url,
            nv.probability,
            nv.is_active,
            now,
            now,
        )
    }

    fn existing_short_url() -> MockShortUrlRepository {
        let mut short_urls = MockShortUrlRepository::new();
        short_urls
            .expect_find_by_id()
            .returning(|id| Ok(Some(short_url(id))));
        short_urls
    }

    #[tokio::test]
    async fn test_create_normalizes_target() {
        let mut variants = MockVariantRepository::new();
        variants
            .expect_create()
            .withf(|nv| nv.target_url == "https://b.example.com/offer" && nv.short_url_id == 7)
            .times(1)
            .returning(|nv| Ok(variant_from(1, nv)));

        let service = VariantService::new(Arc::new(variants), Arc::new(existing_short_url()));
        let variant = service
            .create(7, " HTTPS://B.Example.com:443/offer#x ", p(0.3), true)
            .await
            .unwrap();

        assert_eq!(variant.target_url, "https://b.example.com/offer");
        assert_eq!(variant.probability, p(0.3));
    }

    #[tokio::test]
    async fn test_create_invalid_target_never_reaches_storage() {
        let mut variants = MockVariantRepository::new();
        variants.expect_create().never();

        let service = VariantService::new(Arc::new(variants), Arc::new(existing_short_url()));
        let err = service
            .create(7, "ftp://files.example.com/", p(0.3), true)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_unknown_short_url() {
        let mut short_urls = MockShortUrlRepository::new();
        short_urls.expect_find_by_id().returning(|_| Ok(None));
        let mut variants = MockVariantRepository::new();
        variants.expect_create().never();

        let service = VariantService::new(Arc::new(variants), Arc::new(short_urls));
        let err = service
            .create(99, "https://b.example.com/", p(0.3), true)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_budget_rejection_propagates() {
        let mut variants = MockVariantRepository::new();
        variants.expect_create().returning(|nv| {
            Err(LedgerError::BudgetExceeded {
                allocated: p(0.7),
                requested: nv.probability,
                total: p(0.7) + nv.probability,
            }
            .into())
        });

        let service = VariantService::new(Arc::new(variants), Arc::new(existing_short_url()));
        let err = service
            .create(7, "https://b.example.com/", p(0.31), true)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_empty_patch_rejected() {
        let mut variants = MockVariantRepository::new();
        variants.expect_update().never();

        let service = VariantService::new(Arc::new(variants), Arc::new(MockShortUrlRepository::new()));
        let err = service.update(1, VariantPatch::default()).await.unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_normalizes_target() {
        let mut variants = MockVariantRepository::new();
        variants
            .expect_update()
            .withf(|id, patch| {
                *id == 3 && patch.target_url.as_deref() == Some("https://c.example.com/")
            })
            .times(1)
            .returning(|id, patch| {
                let now = Utc::now();
                Ok(Variant::new(
                    id,
                    7,
                    patch.target_url.unwrap(),
                    p(0.2),
                    true,
                    now,
                    now,
                ))
            });

        let service = VariantService::new(Arc::new(variants), Arc::new(MockShortUrlRepository::new()));
        let patch = VariantPatch {
            target_url: Some("https://C.example.com".to_string()),
            ..Default::default()
        };

        let variant = service.update(3, patch).await.unwrap();
        assert_eq!(variant.target_url, "https://c.example.com/");
    }

    #[tokio::test]
    async fn test_delete_missing_variant() {
        let mut variants = MockVariantRepository::new();
        variants.expect_delete().returning(|_| Ok(false));

        let service = VariantService::new(Arc::new(variants), Arc::new(MockShortUrlRepository::new()));
        let err = service.delete(5).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_allocation() {
        let mut variants = MockVariantRepository::new();
        variants
            .expect_total_active_probability()
            .returning(|_| Ok(p(0.7)));

        let service = VariantService::new(Arc::new(variants), Arc::new(MockShortUrlRepository::new()));
        let allocation = service.allocation(7).await.unwrap();

        assert_eq!(allocation.allocated, p(0.7));
        assert_eq!(allocation.remaining, p(0.3));
    }

    #[tokio::test]
    async fn test_list_all_unknown_short_url() {
        let mut short_urls = MockShortUrlRepository::new();
        short_urls.expect_find_by_id().returning(|_| Ok(None));

        let service = VariantService::new(Arc::new(MockVariantRepository::new()), Arc::new(short_urls));
        let err = service.list_all(42).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
