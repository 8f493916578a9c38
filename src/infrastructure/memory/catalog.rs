//! Seedable in-memory catalogs: short URLs, upstream visits and form mappings.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::entities::{FormFields, ShortUrl, UpstreamVisit};
use crate::domain::repositories::{FormRepository, ShortUrlRepository};
use crate::error::AppError;
use serde_json::json;

fn poisoned() -> AppError {
    AppError::internal("Catalog lock poisoned", json!({}))
}

/// Short URL catalog held in memory.
#[derive(Default)]
pub struct MemoryShortUrlRepository {
    short_urls: RwLock<Vec<ShortUrl>>,
    visits: RwLock<Vec<UpstreamVisit>>,
}

impl MemoryShortUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a short URL (matched by id).
    pub fn insert(&self, short_url: ShortUrl) {
        if let Ok(mut short_urls) = self.short_urls.write() {
            short_urls.retain(|s| s.id != short_url.id);
            short_urls.push(short_url);
        }
    }

    /// Records an upstream visit.
    pub fn add_visit(&self, visit: UpstreamVisit) {
        if let Ok(mut visits) = self.visits.write() {
            visits.push(visit);
        }
    }
}

#[async_trait]
impl ShortUrlRepository for MemoryShortUrlRepository {
    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortUrl>, AppError> {
        let short_urls = self.short_urls.read().map_err(|_| poisoned())?;
        Ok(short_urls
            .iter()
            .find(|s| s.short_code == short_code && s.domain_id.is_none())
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ShortUrl>, AppError> {
        let short_urls = self.short_urls.read().map_err(|_| poisoned())?;
        Ok(short_urls.iter().find(|s| s.id == id).cloned())
    }

    async fn latest_visit(&self, short_url_id: i64) -> Result<Option<UpstreamVisit>, AppError> {
        let visits = self.visits.read().map_err(|_| poisoned())?;
        Ok(visits
            .iter()
            .filter(|v| v.short_url_id == short_url_id)
            .max_by_key(|v| (v.date, v.id))
            .cloned())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.short_urls.read().map(|_| ()).map_err(|_| poisoned())
    }
}

/// Google Forms field mappings held in memory.
#[derive(Default)]
pub struct MemoryFormRepository {
    forms: RwLock<Vec<FormFields>>,
}

impl MemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, fields: FormFields) {
        if let Ok(mut forms) = self.forms.write() {
            forms.retain(|f| f.form_id != fields.form_id);
            forms.push(fields);
        }
    }

    /// Convenience for seeding: a form with the given `(title, entry id)` pairs.
    pub fn insert_entries(&self, form_id: &str, responder_form_id: &str, entries: &[(&str, i64)]) {
        self.insert(FormFields {
            form_id: form_id.to_string(),
            responder_form_id: responder_form_id.to_string(),
            entries: entries
                .iter()
                .map(|(title, id)| (title.to_string(), *id))
                .collect::<HashMap<_, _>>(),
        });
    }
}

#[async_trait]
impl FormRepository for MemoryFormRepository {
    async fn find_fields(&self, form_id: &str) -> Result<Option<FormFields>, AppError> {
        let forms = self.forms.read().map_err(|_| poisoned())?;
        Ok(forms
            .iter()
            .find(|f| f.form_id == form_id || f.responder_form_id == form_id)
            .cloned())
    }
}
