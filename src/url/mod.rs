//! URL handling module for Vasa-Harvest
//!
//! This module provides URL normalization for the per-run visited set and
//! expansion of the configured endpoint templates into absolute URLs.

mod normalize;

use crate::config::SiteConfig;
use crate::UrlError;
use url::{form_urlencoded, Url};

pub use normalize::normalize_url;

/// Expands an endpoint template against the site's base URL
///
/// Every `{placeholder}` occurrence in `template` is replaced with the
/// percent-encoded `value`, then the result is joined onto `base_url`.
///
/// # Examples
///
/// ```
/// use vasa_harvest::url::expand_template;
///
/// let url = expand_template(
///     "https://results.example.com",
///     "/?event={event}&pid=list",
///     "event",
///     "VL 2024",
/// )
/// .unwrap();
/// assert_eq!(url.as_str(), "https://results.example.com/?event=VL+2024&pid=list");
/// ```
pub fn expand_template(
    base_url: &str,
    template: &str,
    placeholder: &str,
    value: &str,
) -> Result<Url, UrlError> {
    let base = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
    let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
    let path = template.replace(&format!("{{{}}}", placeholder), &encoded);

    base.join(&path)
        .map_err(|e| UrlError::Malformed(format!("{}{}: {}", base_url, path, e)))
}

/// Builds the first listing page URL of one event
pub fn seed_url(site: &SiteConfig, event_id: &str) -> Result<Url, UrlError> {
    expand_template(&site.base_url, &site.seed_path, "event", event_id)
}

/// Builds the catalog URL listing every year with results
pub fn years_url(site: &SiteConfig) -> Result<Url, UrlError> {
    let base = Url::parse(&site.base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
    base.join(&site.years_path)
        .map_err(|e| UrlError::Malformed(e.to_string()))
}

/// Builds the catalog URL listing the events of one year
pub fn events_url(site: &SiteConfig, year: &str) -> Result<Url, UrlError> {
    expand_template(&site.base_url, &site.events_path, "year", year)
}
