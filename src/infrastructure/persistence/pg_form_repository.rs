//! PostgreSQL access to Google Forms field mappings.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::FormFields;
use crate::domain::repositories::FormRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct FormRow {
    id: i32,
    form_id: String,
    responder_form_id: String,
}

pub struct PgFormRepository {
    pool: Arc<PgPool>,
}

impl PgFormRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FormRepository for PgFormRepository {
    async fn find_fields(&self, form_id: &str) -> Result<Option<FormFields>, AppError> {
        let form: Option<FormRow> = sqlx::query_as(
            "SELECT id, form_id, responder_form_id FROM google_forms \
             WHERE form_id = $1 OR responder_form_id = $1 \
             LIMIT 1",
        )
        .bind(form_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        let Some(form) = form else {
            return Ok(None);
        };

        let entries: Vec<(String, i64)> = sqlx::query_as(
            "SELECT title, entry_id FROM form_entries WHERE google_form_id = $1 ORDER BY id",
        )
        .bind(form.id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(Some(FormFields {
            form_id: form.form_id,
            responder_form_id: form.responder_form_id,
            entries: entries.into_iter().collect::<HashMap<_, _>>(),
        }))
    }
}
