//! Link discovery and classification on listing pages
//!
//! Every anchor on a listing page is resolved to an absolute URL and run
//! through an ordered rule list:
//!
//! 1. inside the pagination scope -> [`LinkKind::Listing`]
//! 2. URL matches the detail-view pattern -> [`LinkKind::Detail`]
//! 3. anything else -> [`LinkKind::Ignored`]
//!
//! The first rule that matches wins, so a pagination anchor whose URL also
//! matches the detail pattern is still a listing link.

use crate::config::{compile_pattern, compile_selector, SelectorConfig};
use crate::crawler::task::CrawlTask;
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Outcome of classifying one discovered link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Listing,
    Detail,
    Ignored,
}

/// Compiled link rules for one results site
#[derive(Debug, Clone)]
pub struct LinkRules {
    pagination: Selector,
    anchor: Selector,
    detail_pattern: Regex,
}

impl LinkRules {
    /// Compiles the pagination scope selector and the detail-link pattern
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            pagination: compile_selector("pagination", &config.pagination)?,
            anchor: compile_selector("anchor", "a[href]")?,
            detail_pattern: compile_pattern(&config.detail_link)?,
        })
    }

    /// Applies the ordered rules to one resolved link
    pub fn classify(&self, url: &Url, in_pagination_scope: bool) -> LinkKind {
        if in_pagination_scope {
            return LinkKind::Listing;
        }

        if self.detail_pattern.is_match(url.as_str()) {
            return LinkKind::Detail;
        }

        LinkKind::Ignored
    }

    /// Finds the listing and detail links on a listing page
    ///
    /// # Arguments
    ///
    /// * `html` - The listing page body
    /// * `base_url` - The page's final URL, for resolving relative links
    ///
    /// # Returns
    ///
    /// Tasks for every followable link, pagination links first, each URL at
    /// most once per page. Ignored links are dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use vasa_harvest::config::SelectorConfig;
    /// use vasa_harvest::crawler::{LinkRules, TaskKind};
    /// use url::Url;
    ///
    /// let rules = LinkRules::new(&SelectorConfig::default()).unwrap();
    /// let html = r#"<ul class="pagination"><li class="pages-nav-button"><a href="?page=2">&gt;</a></li></ul>
    ///               <a href="?content=detail&idp=7">Svensson</a>"#;
    /// let base = Url::parse("https://results.example.com/?event=X&pid=list").unwrap();
    /// let tasks = rules.discover(html, &base);
    /// assert_eq!(tasks.len(), 2);
    /// assert_eq!(tasks[0].kind, TaskKind::Listing);
    /// assert_eq!(tasks[1].kind, TaskKind::Detail);
    /// ```
    pub fn discover(&self, html: &str, base_url: &Url) -> Vec<CrawlTask> {
        let document = Html::parse_document(html);

        let mut candidates: Vec<(Url, bool)> = Vec::new();

        for scope in document.select(&self.pagination) {
            for anchor in scope_anchors(scope, &self.anchor) {
                if let Some(url) = anchor_url(anchor, base_url) {
                    candidates.push((url, true));
                }
            }
        }

        for anchor in document.select(&self.anchor) {
            if let Some(url) = anchor_url(anchor, base_url) {
                candidates.push((url, false));
            }
        }

        let mut seen = HashSet::new();
        let mut tasks = Vec::new();

        for (url, in_scope) in candidates {
            if !seen.insert(url.as_str().to_string()) {
                continue;
            }

            match self.classify(&url, in_scope) {
                LinkKind::Listing => tasks.push(CrawlTask::listing(url)),
                LinkKind::Detail => tasks.push(CrawlTask::detail(url)),
                LinkKind::Ignored => tracing::trace!("Ignoring link {}", url),
            }
        }

        tasks
    }
}

/// Anchors belonging to a pagination scope element, the element itself included
fn scope_anchors<'a>(scope: ElementRef<'a>, anchor: &'a Selector) -> Vec<ElementRef<'a>> {
    let mut anchors = Vec::new();

    if scope.value().name() == "a" && scope.value().attr("href").is_some() {
        anchors.push(scope);
    }

    anchors.extend(scope.select(anchor));
    anchors
}

fn anchor_url(anchor: ElementRef<'_>, base_url: &Url) -> Option<Url> {
    anchor
        .value()
        .attr("href")
        .and_then(|href| resolve_link(href, base_url))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url),
        _ => None,
    }
}
