//! Visit entities.
//!
//! [`UpstreamVisit`] is a row of the shortener's own (read-only) `visits` table;
//! [`RedirectVisit`] is what this service records for every redirect it serves.

use chrono::{DateTime, Utc};

/// A visit recorded by the upstream shortener before handing the visitor over.
///
/// Only the fields needed for form prefilling are loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamVisit {
    pub id: i64,
    pub short_url_id: i64,
    pub date: DateTime<Utc>,
}

impl UpstreamVisit {
    /// Returns true if the visit happened no more than `max_age_seconds` before `now`.
    pub fn is_recent(&self, now: DateTime<Utc>, max_age_seconds: u64) -> bool {
        let age = now.signed_duration_since(self.date);
        age.num_seconds() <= max_age_seconds as i64
    }
}

/// A redirect served by this service.
#[derive(Debug, Clone)]
pub struct RedirectVisit {
    pub id: i64,
    pub short_url_id: i64,
    /// `None` when the visitor was sent to the primary destination.
    pub variant_id: Option<i64>,
    pub target_url: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub visited_at: DateTime<Utc>,
}

/// Input data for recording a redirect.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRedirectVisit {
    pub short_url_id: i64,
    pub variant_id: Option<i64>,
    pub target_url: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}
