use crate::url::QueryPolicy;
use crate::UrlError;
use url::Url;

/// Tracking query parameters removed when the query string is kept
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "source"];

/// Canonicalizes a URL into the frontier's identity key
///
/// # Canonicalization Steps
///
/// 1. Reject anything that is not http(s) or has no host
/// 2. Lowercase the host (done by the `url` parser for http(s))
/// 3. Normalize the path:
///    - Collapse duplicate slashes
///    - Remove dot segments (. and ..)
///    - Keep a trailing slash if the input had one
/// 4. Remove the fragment
/// 5. Apply the query policy: strip it, or drop tracking parameters and sort the rest
///
/// # Examples
///
/// ```
/// use sumi_scribe::url::{canonicalize_str, QueryPolicy};
///
/// let url = canonicalize_str("https://X/docs//b?tab=1#frag", QueryPolicy::Strip).unwrap();
/// assert_eq!(url.as_str(), "https://x/docs/b");
/// ```
pub fn canonicalize(url: &Url, policy: QueryPolicy) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    let mut url = url.clone();

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    match policy {
        QueryPolicy::Strip => url.set_query(None),
        QueryPolicy::Keep => {
            if url.query().is_some() {
                let params = filter_and_sort_query_params(&url);
                if params.is_empty() {
                    url.set_query(None);
                } else {
                    url.query_pairs_mut()
                        .clear()
                        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                }
            }
        }
    }

    Ok(url)
}

/// Parses and canonicalizes a URL string
pub fn canonicalize_str(raw: &str, policy: QueryPolicy) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(&url, policy)
}

/// Normalizes a URL path by removing dot segments and duplicate slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let trailing_slash = path.len() > 1 && path.ends_with('/');
    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", normalized_segments.join("/"));
    if trailing_slash {
        result.push('/');
    }
    result
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(raw: &str) -> String {
        canonicalize_str(raw, QueryPolicy::Strip)
            .unwrap()
            .to_string()
    }

    fn keep(raw: &str) -> String {
        canonicalize_str(raw, QueryPolicy::Keep).unwrap().to_string()
    }

    #[test]
    fn test_remove_fragment() {
        assert_eq!(strip("https://x/docs/b#frag"), "https://x/docs/b");
    }

    #[test]
    fn test_strip_query_by_default() {
        assert_eq!(strip("https://x/docs/b?page=2"), "https://x/docs/b");
    }

    #[test]
    fn test_keep_query_sorted() {
        assert_eq!(
            keep("https://example.com/page?b=2&a=1"),
            "https://example.com/page?a=1&b=2"
        );
    }

    #[test]
    fn test_keep_query_drops_tracking_params() {
        assert_eq!(
            keep("https://example.com/page?keep=yes&utm_medium=email&fbclid=123"),
            "https://example.com/page?keep=yes"
        );
        assert_eq!(
            keep("https://example.com/page?utm_source=a&gclid=c"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_lowercase_host_preserves_path_case() {
        assert_eq!(
            strip("https://REACT.DEV/reference/useState"),
            "https://react.dev/reference/useState"
        );
    }

    #[test]
    fn test_keeps_trailing_slash() {
        assert_eq!(strip("https://lit.dev/docs/"), "https://lit.dev/docs/");
        assert_eq!(strip("https://lit.dev/docs"), "https://lit.dev/docs");
    }

    #[test]
    fn test_dot_segments_and_duplicate_slashes() {
        assert_eq!(
            strip("https://example.com///a/../b/./c"),
            "https://example.com/b/c"
        );
    }

    #[test]
    fn test_empty_path_becomes_root() {
        assert_eq!(strip("https://example.com"), "https://example.com/");
    }

    #[test]
    fn test_http_is_left_alone() {
        assert_eq!(strip("http://127.0.0.1:8080/a"), "http://127.0.0.1:8080/a");
    }

    #[test]
    fn test_default_port_dropped() {
        assert_eq!(strip("https://example.com:443/a"), "https://example.com/a");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = canonicalize_str("ftp://example.com/page", QueryPolicy::Strip);
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        let result = canonicalize_str("not a url", QueryPolicy::Strip);
        assert!(matches!(result, Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_equivalent_references_compare_equal() {
        let a = canonicalize_str("https://x/docs/b#one", QueryPolicy::Strip).unwrap();
        let b = canonicalize_str("https://X/docs/./b?x=1#two", QueryPolicy::Strip).unwrap();
        assert_eq!(a, b);
    }
}
