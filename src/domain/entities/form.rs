//! Google Forms field mapping used for prefilled redirects.

use std::collections::HashMap;

/// Field titles this service knows how to prefill.
pub const UTM_FIELDS: [&str; 3] = ["utm_source", "utm_medium", "utm_campaign"];
pub const CLICK_ID_FIELD: &str = "click_id";
pub const CLICK_TIMESTAMP_FIELD: &str = "click_timestamp";

/// Entry ids of a Google Form, keyed by field title.
///
/// Populated by the external Forms discovery job (`google_forms` and
/// `form_entries` tables); this service only reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    pub form_id: String,
    pub responder_form_id: String,
    pub entries: HashMap<String, i64>,
}

impl FormFields {
    /// Query parameter name for the field with the given title, e.g. `entry.1234`.
    pub fn entry_param(&self, title: &str) -> Option<String> {
        self.entries.get(title).map(|id| format!("entry.{id}"))
    }
}
