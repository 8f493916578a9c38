//! In-memory variant repository with per-short-URL locking.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::entities::{NewVariant, Variant, VariantPatch};
use crate::domain::ledger;
use crate::domain::probability::Probability;
use crate::domain::repositories::VariantRepository;
use crate::error::AppError;

type Ledger = Arc<tokio::sync::Mutex<Vec<Variant>>>;

/// Variant storage keyed by short URL.
///
/// Each short URL has its own async mutex guarding its variant list; a
/// mutation holds it across read, validate and write. The registry lock is
/// only held to look up or create that mutex, so mutations of different short
/// URLs proceed in parallel.
#[derive(Default)]
pub struct MemoryVariantRepository {
    ledgers: Mutex<HashMap<i64, Ledger>>,
    owners: Mutex<HashMap<i64, i64>>,
    next_id: AtomicI64,
}

fn poisoned() -> AppError {
    AppError::internal("Variant store lock poisoned", json!({}))
}

fn not_found(id: i64) -> AppError {
    AppError::not_found("Variant not found", json!({ "variant_id": id }))
}

impl MemoryVariantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self, short_url_id: i64) -> Result<Ledger, AppError> {
        let mut ledgers = self.ledgers.lock().map_err(|_| poisoned())?;
        Ok(ledgers.entry(short_url_id).or_default().clone())
    }

    fn existing_ledger(&self, short_url_id: i64) -> Result<Option<Ledger>, AppError> {
        let ledgers = self.ledgers.lock().map_err(|_| poisoned())?;
        Ok(ledgers.get(&short_url_id).cloned())
    }

    fn owners(&self) -> Result<MutexGuard<'_, HashMap<i64, i64>>, AppError> {
        self.owners.lock().map_err(|_| poisoned())
    }

    fn owner_of(&self, id: i64) -> Result<Option<i64>, AppError> {
        Ok(self.owners()?.get(&id).copied())
    }

    async fn snapshot(&self, short_url_id: i64) -> Result<Vec<Variant>, AppError> {
        match self.existing_ledger(short_url_id)? {
            Some(slot) => Ok(slot.lock().await.clone()),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl VariantRepository for MemoryVariantRepository {
    async fn list_by_short_url(&self, short_url_id: i64) -> Result<Vec<Variant>, AppError> {
        self.snapshot(short_url_id).await
    }

    async fn list_active(&self, short_url_id: i64) -> Result<Vec<Variant>, AppError> {
        let mut variants = self.snapshot(short_url_id).await?;
        variants.retain(|v| v.is_active);
        Ok(variants)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Variant>, AppError> {
        let Some(short_url_id) = self.owner_of(id)? else {
            return Ok(None);
        };
        Ok(self
            .snapshot(short_url_id)
            .await?
            .into_iter()
            .find(|v| v.id == id))
    }

    async fn create(&self, new_variant: NewVariant) -> Result<Variant, AppError> {
        let slot = self.ledger(new_variant.short_url_id)?;
        let mut variants = slot.lock().await;

        ledger::validate_new(&new_variant, &variants)?;

        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let variant = Variant::new(
            id,
            new_variant.short_url_id,
            new_variant.target_url,
            new_variant.probability,
            new_variant.is_active,
            now,
            now,
        );

        self.owners()?.insert(id, variant.short_url_id);
        variants.push(variant.clone());
        Ok(variant)
    }

    async fn update(&self, id: i64, patch: VariantPatch) -> Result<Variant, AppError> {
        let short_url_id = self.owner_of(id)?.ok_or_else(|| not_found(id))?;
        let slot = self.ledger(short_url_id)?;
        let mut variants = slot.lock().await;

        let pos = variants
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| not_found(id))?;
        let updated = ledger::apply_patch(&variants[pos], &patch, &variants, Utc::now())?;

        variants[pos] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let Some(short_url_id) = self.owner_of(id)? else {
            return Ok(false);
        };
        let slot = self.ledger(short_url_id)?;
        let mut variants = slot.lock().await;

        let before = variants.len();
        variants.retain(|v| v.id != id);
        self.owners()?.remove(&id);

        Ok(variants.len() < before)
    }

    async fn total_active_probability(&self, short_url_id: i64) -> Result<Probability, AppError> {
        let variants = self.snapshot(short_url_id).await?;
        Ok(ledger::allocated(&variants, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(value: f64) -> Probability {
        Probability::from_f64(value).unwrap()
    }

    fn new_variant(short_url_id: i64, target: &str, probability: f64) -> NewVariant {
        NewVariant {
            short_url_id,
            target_url: target.to_string(),
            probability: p(probability),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_ids_increase_in_creation_order() {
        let repo = MemoryVariantRepository::new();
        let a = repo.create(new_variant(1, "https://a.example.com/", 0.1)).await.unwrap();
        let b = repo.create(new_variant(2, "https://b.example.com/", 0.1)).await.unwrap();
        let c = repo.create(new_variant(1, "https://c.example.com/", 0.1)).await.unwrap();

        assert!(a.id < b.id && b.id < c.id);

        let ids: Vec<i64> = repo.list_by_short_url(1).await.unwrap().iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[tokio::test]
    async fn test_budgets_are_per_short_url() {
        let repo = MemoryVariantRepository::new();
        repo.create(new_variant(1, "https://a.example.com/", 1.0)).await.unwrap();
        repo.create(new_variant(2, "https://b.example.com/", 1.0)).await.unwrap();

        assert_eq!(repo.total_active_probability(1).await.unwrap(), Probability::ONE);
        assert_eq!(repo.total_active_probability(2).await.unwrap(), Probability::ONE);
        assert!(repo.create(new_variant(1, "https://c.example.com/", 0.000001)).await.is_err());
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let repo = MemoryVariantRepository::new();

        let err = repo.update(42, VariantPatch::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(!repo.delete(42).await.unwrap());
        assert!(repo.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_from_lookup() {
        let repo = MemoryVariantRepository::new();
        let v = repo.create(new_variant(1, "https://a.example.com/", 0.4)).await.unwrap();

        assert!(repo.delete(v.id).await.unwrap());
        assert!(repo.find_by_id(v.id).await.unwrap().is_none());
        assert!(!repo.delete(v.id).await.unwrap());
    }
}
