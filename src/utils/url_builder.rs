//! Redirect URL construction: query forwarding and Google Forms prefill.

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::domain::entities::form::{CLICK_ID_FIELD, CLICK_TIMESTAMP_FIELD, UTM_FIELDS};
use crate::domain::entities::{FormFields, UpstreamVisit};

static FORM_ID_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"/d/e/([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"/d/([A-Za-z0-9_-]+)").unwrap(),
    ]
});

const GOOGLE_FORMS_MARKER: &str = "docs.google.com/forms";

/// Returns true if `url` points at a Google Form.
pub fn is_google_form(url: &str) -> bool {
    url.contains(GOOGLE_FORMS_MARKER)
}

/// Extracts the form id from a Google Forms URL.
///
/// The responder format (`/d/e/<id>`) wins over the edit format (`/d/<id>`).
pub fn extract_form_id(url: &str) -> Option<&str> {
    FORM_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn upsert(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    match params.iter_mut().find(|(k, _)| k.as_str() == key) {
        Some(slot) => slot.1 = value.to_string(),
        None => params.push((key.to_string(), value.to_string())),
    }
}

/// Merges `params` into the query string of `target`.
///
/// Existing parameters keep their position; a parameter present in both takes
/// the value from `params`. The fragment is preserved. An empty result leaves
/// no trailing `?`.
///
/// # Errors
///
/// Returns [`url::ParseError`] if `target` is not an absolute URL.
pub fn merge_query(target: &str, params: &[(String, String)]) -> Result<String, url::ParseError> {
    let mut url = Url::parse(target)?;

    let mut merged: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    for (key, value) in params {
        upsert(&mut merged, key, value);
    }

    if merged.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(merged.iter());
    }

    Ok(url.into())
}

/// Computes `entry.<id>` prefill parameters for a Google Form.
///
/// `utm_*` values are taken from the inbound query. `click_id` and
/// `click_timestamp` come from `last_visit` when it is at most
/// `click_id_max_age` seconds old. Fields the form does not define are skipped.
pub fn form_prefill_params(
    fields: &FormFields,
    inbound: &[(String, String)],
    last_visit: Option<&UpstreamVisit>,
    now: DateTime<Utc>,
    click_id_max_age: u64,
) -> Vec<(String, String)> {
    let mut params = Vec::new();

    for title in UTM_FIELDS {
        let value = inbound.iter().find(|(k, _)| k.as_str() == title).map(|(_, v)| v);
        if let (Some(value), Some(entry)) = (value, fields.entry_param(title)) {
            tracing::debug!(field = title, entry = %entry, "Mapped form field");
            params.push((entry, value.clone()));
        }
    }

    if let Some(visit) = last_visit.filter(|v| v.is_recent(now, click_id_max_age)) {
        if let Some(entry) = fields.entry_param(CLICK_ID_FIELD) {
            params.push((entry, visit.id.to_string()));
        }
        if let Some(entry) = fields.entry_param(CLICK_TIMESTAMP_FIELD) {
            params.push((
                entry,
                visit.date.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }
    }

    params
}

/// Builds the final redirect URL for a chosen target.
///
/// The target's own query parameters are kept. The inbound parameters are
/// merged on top, then `prefill` parameters.
///
/// # Errors
///
/// Returns [`url::ParseError`] if `target` is not an absolute URL.
pub fn build_url(
    target: &str,
    inbound: &[(String, String)],
    prefill: &[(String, String)],
) -> Result<String, url::ParseError> {
    let mut extra: Vec<(String, String)> = Vec::new();
    for (key, value) in inbound.iter().chain(prefill) {
        upsert(&mut extra, key, value);
    }

    merge_query(target, &extra)
}
