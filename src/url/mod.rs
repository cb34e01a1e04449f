//! URL handling module for Sumi-Scribe
//!
//! This module provides URL canonicalization (the frontier's identity key) and the
//! include/exclude filtering applied to every discovered link.

mod matcher;
mod normalize;

use serde::Deserialize;

// Re-export main functions
pub use matcher::{same_origin, LinkFilter};
pub use normalize::{canonicalize, canonicalize_str};

/// What canonicalization does with a URL's query string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryPolicy {
    /// Drop the query string entirely
    #[default]
    Strip,
    /// Keep it, minus tracking parameters, with pairs sorted by key
    Keep,
}

/// Returns the last non-empty path segment of a URL, falling back to its host
///
/// Used as the title of pages that carry no `<h1>`. The segment is
/// percent-decoded; a segment that does not decode to UTF-8 is kept as is.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scribe::url::last_path_segment;
///
/// let url = Url::parse("https://lit.dev/docs/templates/expressions/").unwrap();
/// assert_eq!(last_path_segment(&url), "expressions");
///
/// let url = Url::parse("https://lit.dev/").unwrap();
/// assert_eq!(last_path_segment(&url), "lit.dev");
/// ```
pub fn last_path_segment(url: &url::Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| {
            urlencoding::decode(s)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .or_else(|| url.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| url.as_str().to_string())
}
