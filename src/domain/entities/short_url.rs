//! Short URL entity (read-only, owned by the upstream shortener).

use chrono::{DateTime, Utc};
use url::Url;

use crate::utils::url_builder::merge_query;

/// A short URL record from the externally managed `short_urls` table.
///
/// The service never writes these rows. A short URL's `original_url` usually
/// points back at this service with the real destination carried in a `url`
/// query parameter, e.g. `https://go.example.com/?url=https://landing.example.com&utm_source=x`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortUrl {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub title: Option<String>,
    pub domain_id: Option<i64>,
    /// The upstream shortener's own setting. Redirects served here always
    /// forward the inbound query.
    pub forward_query: bool,
    pub date_created: DateTime<Utc>,
}

impl ShortUrl {
    /// Extracts the destination carried in the `url` query parameter of
    /// `original_url`, with the remaining parameters merged onto it.
    ///
    /// Returns `None` if `original_url` does not parse or has no `url` parameter.
    pub fn redirect_url(&self) -> Option<String> {
        let parsed = Url::parse(&self.original_url).ok()?;

        let mut destination = None;
        let mut rest = Vec::new();
        for (key, value) in parsed.query_pairs() {
            if key == "url" && destination.is_none() {
                destination = Some(value.into_owned());
            } else if key != "url" {
                rest.push((key.into_owned(), value.into_owned()));
            }
        }

        let destination = destination?;
        merge_query(&destination, &rest).ok()
    }

    /// The primary destination: the embedded `url` target if present,
    /// otherwise `original_url` itself.
    pub fn primary_target(&self) -> String {
        self.redirect_url()
            .unwrap_or_else(|| self.original_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_url(original_url: &str) -> ShortUrl {
        ShortUrl {
            id: 1,
            short_code: "promo".to_string(),
            original_url: original_url.to_string(),
            title: None,
            domain_id: None,
            forward_query: true,
            date_created: Utc::now(),
        }
    }

    #[test]
    fn test_redirect_url_from_query_parameter() {
        let s = short_url("https://go.example.com/?url=https%3A%2F%2Flanding.example.com%2Fpage");
        assert_eq!(
            s.redirect_url().as_deref(),
            Some("https://landing.example.com/page")
        );
    }

    #[test]
    fn test_redirect_url_merges_remaining_parameters() {
        let s = short_url(
            "https://go.example.com/?utm_source=mail&url=https%3A%2F%2Flanding.example.com%2F%3Fref%3D1",
        );
        assert_eq!(
            s.redirect_url().as_deref(),
            Some("https://landing.example.com/?ref=1&utm_source=mail")
        );
    }

    #[test]
    fn test_redirect_url_missing_parameter() {
        let s = short_url("https://landing.example.com/page");
        assert!(s.redirect_url().is_none());
        assert_eq!(s.primary_target(), "https://landing.example.com/page");
    }

    #[test]
    fn test_redirect_url_invalid_original() {
        let s = short_url("not a url");
        assert!(s.redirect_url().is_none());
        assert_eq!(s.primary_target(), "not a url");
    }
}
