//! PostgreSQL implementation of redirect visit recording.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewRedirectVisit, RedirectVisit};
use crate::domain::repositories::VisitRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct RedirectVisitRow {
    id: i64,
    short_url_id: i64,
    variant_id: Option<i64>,
    target_url: String,
    ip: Option<String>,
    user_agent: Option<String>,
    referer: Option<String>,
    visited_at: DateTime<Utc>,
}

/// Writes served redirects into `redirect_visits`.
pub struct PgVisitRepository {
    pool: Arc<PgPool>,
}

impl PgVisitRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitRepository for PgVisitRepository {
    async fn record(&self, visit: NewRedirectVisit) -> Result<RedirectVisit, AppError> {
        let row: RedirectVisitRow = sqlx::query_as(
            "INSERT INTO redirect_visits (short_url_id, variant_id, target_url, ip, user_agent, referer) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, short_url_id, variant_id, target_url, ip, user_agent, referer, visited_at",
        )
        .bind(visit.short_url_id)
        .bind(visit.variant_id)
        .bind(visit.target_url)
        .bind(visit.ip)
        .bind(visit.user_agent)
        .bind(visit.referer)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(RedirectVisit {
            id: row.id,
            short_url_id: row.short_url_id,
            variant_id: row.variant_id,
            target_url: row.target_url,
            ip: row.ip,
            user_agent: row.user_agent,
            referer: row.referer,
            visited_at: row.visited_at,
        })
    }
}
