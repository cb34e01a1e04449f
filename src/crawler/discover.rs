//! Link discovery: hyperlinks of a page, canonicalized and filtered
//!
//! # Link Extraction Rules
//!
//! **Include:**
//! - `<a href="...">` tags anywhere in the page
//! - `<link rel="canonical" href="...">`
//!
//! **Exclude:**
//! - `<a href="..." download>`
//! - `javascript:`, `mailto:`, `tel:` links
//! - Data URIs
//! - Fragment-only links (same-page anchors)
//!
//! Surviving links are resolved against the page's own URL, canonicalized, and
//! then passed through the include-prefix and exclude-substring filters.

use crate::config::FilterConfig;
use crate::url::{canonicalize, LinkFilter, QueryPolicy};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Finds the in-scope links of a page
///
/// Discovery is a pure function of its inputs; the harvester decides what to
/// do with the returned URLs.
#[derive(Debug, Clone)]
pub struct LinkDiscoverer {
    filter: LinkFilter,
    policy: QueryPolicy,
}

impl LinkDiscoverer {
    /// Creates a discoverer from explicit filters
    pub fn new(filter: LinkFilter, policy: QueryPolicy) -> Self {
        Self { filter, policy }
    }

    /// Creates a discoverer from the filter configuration
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(LinkFilter::from_config(config), config.query)
    }

    /// Returns the canonical in-scope links of a page, deduplicated, in document order
    ///
    /// # Arguments
    ///
    /// * `page_url` - The URL the content was served from; relative links and
    ///   path-based include prefixes are resolved against it
    /// * `content` - The HTML content of the page
    pub fn discover(&self, page_url: &Url, content: &str) -> Vec<Url> {
        let mut seen = HashSet::new();

        raw_links(content)
            .into_iter()
            .filter_map(|href| resolve_link(&href, page_url))
            .filter_map(|absolute| canonicalize(&absolute, self.policy).ok())
            .filter(|candidate| self.filter.includes(candidate, page_url))
            .filter(|candidate| !self.filter.excludes(candidate))
            .filter(|candidate| seen.insert(candidate.as_str().to_string()))
            .collect()
    }
}

/// Collects raw href values from anchors and canonical links
fn raw_links(content: &str) -> Vec<String> {
    let document = Html::parse_document(content);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                links.push(href.to_string());
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                links.push(href.to_string());
            }
        }
    }

    links
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only and empty hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then_some(absolute)
}
