//! Visit event model for asynchronous redirect recording.

use crate::domain::entities::NewRedirectVisit;

/// A served redirect, queued for persistence by
/// [`crate::domain::visit_worker::run_visit_worker`].
///
/// The redirect response never waits for the write; if the queue is full the
/// event is dropped and counted.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitEvent {
    pub short_code: String,
    pub short_url_id: i64,
    pub variant_id: Option<i64>,
    pub target_url: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl VisitEvent {
    pub fn new(
        short_code: String,
        short_url_id: i64,
        variant_id: Option<i64>,
        target_url: String,
        ip: Option<String>,
        user_agent: Option<&str>,
        referer: Option<&str>,
    ) -> Self {
        Self {
            short_code,
            short_url_id,
            variant_id,
            target_url,
            ip,
            user_agent: user_agent.map(str::to_string),
            referer: referer.map(str::to_string),
        }
    }

    /// Label used for the `arm` dimension of redirect metrics.
    pub fn arm(&self) -> &'static str {
        if self.variant_id.is_some() {
            "variant"
        } else {
            "primary"
        }
    }
}

impl From<VisitEvent> for NewRedirectVisit {
    fn from(ev: VisitEvent) -> Self {
        Self {
            short_url_id: ev.short_url_id,
            variant_id: ev.variant_id,
            target_url: ev.target_url,
            ip: ev.ip,
            user_agent: ev.user_agent,
            referer: ev.referer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_event_creation_full() {
        let event = VisitEvent::new(
            "promo".to_string(),
            3,
            Some(9),
            "https://b.example.com/".to_string(),
            Some("192.168.1.1".to_string()),
            Some("Mozilla/5.0"),
            Some("https://google.com"),
        );

        assert_eq!(event.short_code, "promo");
        assert_eq!(event.variant_id, Some(9));
        assert_eq!(event.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(event.referer.as_deref(), Some("https://google.com"));
        assert_eq!(event.arm(), "variant");
    }

    #[test]
    fn test_visit_event_into_new_visit() {
        let event = VisitEvent::new(
            "promo".to_string(),
            3,
            None,
            "https://primary.example.com/".to_string(),
            None,
            None,
            None,
        );
        assert_eq!(event.arm(), "primary");

        let visit: NewRedirectVisit = event.into();
        assert_eq!(visit.short_url_id, 3);
        assert!(visit.variant_id.is_none());
        assert_eq!(visit.target_url, "https://primary.example.com/");
        assert!(visit.ip.is_none());
    }
}
