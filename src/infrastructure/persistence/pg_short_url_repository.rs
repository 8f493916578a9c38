//! PostgreSQL read access to the upstream short URL catalog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{ShortUrl, UpstreamVisit};
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct ShortUrlRow {
    id: i64,
    short_code: String,
    original_url: String,
    title: Option<String>,
    domain_id: Option<i64>,
    forward_query: bool,
    date_created: DateTime<Utc>,
}

impl From<ShortUrlRow> for ShortUrl {
    fn from(row: ShortUrlRow) -> Self {
        Self {
            id: row.id,
            short_code: row.short_code,
            original_url: row.original_url,
            title: row.title,
            domain_id: row.domain_id,
            forward_query: row.forward_query,
            date_created: row.date_created,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VisitRow {
    id: i64,
    short_url_id: i64,
    date: DateTime<Utc>,
}

const SHORT_URL_COLUMNS: &str =
    "id, short_code, original_url, title, domain_id, forward_query, date_created";

/// Reads `short_urls` and `visits`. Never writes.
pub struct PgShortUrlRepository {
    pool: Arc<PgPool>,
}

impl PgShortUrlRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShortUrlRepository for PgShortUrlRepository {
    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortUrl>, AppError> {
        let row: Option<ShortUrlRow> = sqlx::query_as(&format!(
            "SELECT {SHORT_URL_COLUMNS} FROM short_urls \
             WHERE short_code = $1 AND domain_id IS NULL"
        ))
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(ShortUrl::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ShortUrl>, AppError> {
        let row: Option<ShortUrlRow> =
            sqlx::query_as(&format!("SELECT {SHORT_URL_COLUMNS} FROM short_urls WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(row.map(ShortUrl::from))
    }

    async fn latest_visit(&self, short_url_id: i64) -> Result<Option<UpstreamVisit>, AppError> {
        let row: Option<VisitRow> = sqlx::query_as(
            "SELECT id, short_url_id, date FROM visits \
             WHERE short_url_id = $1 \
             ORDER BY date DESC, id DESC \
             LIMIT 1",
        )
        .bind(short_url_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|r| UpstreamVisit {
            id: r.id,
            short_url_id: r.short_url_id,
            date: r.date,
        }))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
