//! PostgreSQL implementation of the variant repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewVariant, Variant, VariantPatch};
use crate::domain::ledger;
use crate::domain::probability::Probability;
use crate::domain::repositories::VariantRepository;
use crate::error::AppError;

const VARIANT_COLUMNS: &str =
    "id, short_url_id, target_url, probability_ppm, is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct VariantRow {
    id: i64,
    short_url_id: i64,
    target_url: String,
    probability_ppm: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VariantRow> for Variant {
    type Error = AppError;

    fn try_from(row: VariantRow) -> Result<Self, Self::Error> {
        let probability = u32::try_from(row.probability_ppm)
            .ok()
            .and_then(|ppm| Probability::from_ppm(ppm).ok())
            .ok_or_else(|| {
                tracing::error!(
                    variant_id = row.id,
                    probability_ppm = row.probability_ppm,
                    "Stored probability out of range"
                );
                AppError::internal("Corrupt variant row", json!({ "variant_id": row.id }))
            })?;

        Ok(Variant::new(
            row.id,
            row.short_url_id,
            row.target_url,
            probability,
            row.is_active,
            row.created_at,
            row.updated_at,
        ))
    }
}

fn ppm_param(probability: Probability) -> i32 {
    // ppm is at most 1_000_000.
    probability.ppm() as i32
}

/// PostgreSQL repository for variants (`ab_tests` table).
///
/// Every mutation runs in its own transaction that starts by taking
/// `pg_advisory_xact_lock(short_url_id)`. The sibling set is read, checked
/// against the budget and written while the lock is held; it is released on
/// commit or rollback. Locks are keyed by short URL, so different short URLs
/// never contend.
pub struct PgVariantRepository {
    pool: Arc<PgPool>,
}

impl PgVariantRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn lock_short_url(conn: &mut PgConnection, short_url_id: i64) -> Result<(), AppError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(short_url_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    async fn fetch_siblings(
        conn: &mut PgConnection,
        short_url_id: i64,
    ) -> Result<Vec<Variant>, AppError> {
        let rows: Vec<VariantRow> = sqlx::query_as(&format!(
            "SELECT {VARIANT_COLUMNS} FROM ab_tests WHERE short_url_id = $1 ORDER BY id"
        ))
        .bind(short_url_id)
        .fetch_all(conn)
        .await?;

        rows.into_iter().map(Variant::try_from).collect()
    }
}

#[async_trait]
impl VariantRepository for PgVariantRepository {
    async fn list_by_short_url(&self, short_url_id: i64) -> Result<Vec<Variant>, AppError> {
        let rows: Vec<VariantRow> = sqlx::query_as(&format!(
            "SELECT {VARIANT_COLUMNS} FROM ab_tests WHERE short_url_id = $1 ORDER BY id"
        ))
        .bind(short_url_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(Variant::try_from).collect()
    }

    async fn list_active(&self, short_url_id: i64) -> Result<Vec<Variant>, AppError> {
        let rows: Vec<VariantRow> = sqlx::query_as(&format!(
            "SELECT {VARIANT_COLUMNS} FROM ab_tests \
             WHERE short_url_id = $1 AND is_active \
             ORDER BY id"
        ))
        .bind(short_url_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(Variant::try_from).collect()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Variant>, AppError> {
        let row: Option<VariantRow> =
            sqlx::query_as(&format!("SELECT {VARIANT_COLUMNS} FROM ab_tests WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool.as_ref())
                .await?;

        row.map(Variant::try_from).transpose()
    }

    async fn create(&self, new_variant: NewVariant) -> Result<Variant, AppError> {
        let mut tx = self.pool.begin().await?;

        Self::lock_short_url(&mut tx, new_variant.short_url_id).await?;
        let siblings = Self::fetch_siblings(&mut tx, new_variant.short_url_id).await?;
        ledger::validate_new(&new_variant, &siblings)?;

        let row: VariantRow = sqlx::query_as(&format!(
            "INSERT INTO ab_tests (short_url_id, target_url, probability_ppm, is_active) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {VARIANT_COLUMNS}"
        ))
        .bind(new_variant.short_url_id)
        .bind(&new_variant.target_url)
        .bind(ppm_param(new_variant.probability))
        .bind(new_variant.is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn update(&self, id: i64, patch: VariantPatch) -> Result<Variant, AppError> {
        let not_found = || AppError::not_found("Variant not found", json!({ "variant_id": id }));

        let mut tx = self.pool.begin().await?;

        let short_url_id: Option<i64> =
            sqlx::query_scalar("SELECT short_url_id FROM ab_tests WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let short_url_id = short_url_id.ok_or_else(not_found)?;

        Self::lock_short_url(&mut tx, short_url_id).await?;

        // Re-read under the lock; the row may have changed or gone meanwhile.
        let siblings = Self::fetch_siblings(&mut tx, short_url_id).await?;
        let current = siblings.iter().find(|v| v.id == id).ok_or_else(not_found)?;
        let updated = ledger::apply_patch(current, &patch, &siblings, Utc::now())?;

        let row: VariantRow = sqlx::query_as(&format!(
            "UPDATE ab_tests \
             SET target_url = $2, probability_ppm = $3, is_active = $4, updated_at = $5 \
             WHERE id = $1 \
             RETURNING {VARIANT_COLUMNS}"
        ))
        .bind(id)
        .bind(&updated.target_url)
        .bind(ppm_param(updated.probability))
        .bind(updated.is_active)
        .bind(updated.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM ab_tests WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn total_active_probability(&self, short_url_id: i64) -> Result<Probability, AppError> {
        let active = self.list_active(short_url_id).await?;
        Ok(ledger::allocated(&active, None))
    }
}
