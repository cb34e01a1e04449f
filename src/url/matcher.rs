use crate::config::FilterConfig;
use url::Url;

/// Include/exclude filter applied to candidate links
///
/// Include prefixes come in two forms:
/// 1. Absolute: "https://react.dev/reference/" matches the full canonical URL
/// 2. Path: "/docs/" matches the URL path, and only on the page's own origin
///
/// An empty include list accepts every same-origin candidate. Exclude substrings
/// are tested against the full canonical URL and always win over includes.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    include_prefixes: Vec<String>,
    exclude_substrings: Vec<String>,
}

impl LinkFilter {
    /// Creates a filter from explicit prefix and substring lists
    pub fn new(include_prefixes: Vec<String>, exclude_substrings: Vec<String>) -> Self {
        Self {
            include_prefixes,
            exclude_substrings,
        }
    }

    /// Creates a filter from the `[filter]` configuration section
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(
            config.include_prefixes.clone(),
            config.exclude_substrings.clone(),
        )
    }

    /// Returns true if `candidate` passes the include test relative to `origin`
    pub fn includes(&self, candidate: &Url, origin: &Url) -> bool {
        if self.include_prefixes.is_empty() {
            return same_origin(candidate, origin);
        }

        self.include_prefixes
            .iter()
            .any(|prefix| matches_prefix(prefix, candidate, origin))
    }

    /// Returns true if `candidate` contains any excluded substring
    pub fn excludes(&self, candidate: &Url) -> bool {
        let candidate = candidate.as_str();
        self.exclude_substrings
            .iter()
            .any(|pattern| candidate.contains(pattern.as_str()))
    }

    /// Include check, then exclude check
    pub fn allows(&self, candidate: &Url, origin: &Url) -> bool {
        self.includes(candidate, origin) && !self.excludes(candidate)
    }
}

/// Checks a single include prefix against a candidate URL
fn matches_prefix(prefix: &str, candidate: &Url, origin: &Url) -> bool {
    if prefix.contains("://") {
        candidate.as_str().starts_with(prefix)
    } else {
        same_origin(candidate, origin) && candidate.path().starts_with(prefix)
    }
}

/// Returns true if both URLs share scheme, host and port
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scribe::url::same_origin;
///
/// let a = Url::parse("https://lit.dev/docs/").unwrap();
/// let b = Url::parse("https://lit.dev/blog/").unwrap();
/// let c = Url::parse("https://github.com/lit").unwrap();
/// assert!(same_origin(&a, &b));
/// assert!(!same_origin(&a, &c));
/// ```
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}
