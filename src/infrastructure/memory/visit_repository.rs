//! In-memory redirect visit log.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Mutex;

use crate::domain::entities::{NewRedirectVisit, RedirectVisit};
use crate::domain::repositories::VisitRepository;
use crate::error::AppError;

#[derive(Default)]
pub struct MemoryVisitRepository {
    visits: Mutex<Vec<RedirectVisit>>,
}

impl MemoryVisitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded visits in insertion order.
    pub fn visits(&self) -> Vec<RedirectVisit> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VisitRepository for MemoryVisitRepository {
    async fn record(&self, visit: NewRedirectVisit) -> Result<RedirectVisit, AppError> {
        let mut visits = self
            .visits
            .lock()
            .map_err(|_| AppError::internal("Visit log lock poisoned", json!({})))?;

        let recorded = RedirectVisit {
            id: visits.len() as i64 + 1,
            short_url_id: visit.short_url_id,
            variant_id: visit.variant_id,
            target_url: visit.target_url,
            ip: visit.ip,
            user_agent: visit.user_agent,
            referer: visit.referer,
            visited_at: Utc::now(),
        };
        visits.push(recorded.clone());
        Ok(recorded)
    }
}
