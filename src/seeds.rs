//! Seed collection
//!
//! A harvest starts from the union of three sources, in this order:
//!
//! 1. The `seeds` list of the `[crawl]` section
//! 2. A newline-delimited seed file (`#` starts a comment)
//! 3. A sitemap, given as a URL or a local path; sitemap indexes are followed
//!
//! Explicit seeds are trusted as given. Sitemap entries pass through the same
//! include/exclude filter as discovered links, since sitemaps routinely list
//! far more of a site than the part being harvested.

use crate::config::Config;
use crate::url::{canonicalize_str, LinkFilter, QueryPolicy};
use crate::DiscoveryError;
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use sitemap::structs::Location;
use std::collections::HashSet;
use std::path::Path;
use url::Url;

/// Upper bound on sitemap documents read for one run, indexes included
const MAX_SITEMAP_DOCUMENTS: usize = 256;

/// Collects, canonicalizes and de-duplicates the seed URLs of a run
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `client` - HTTP client used for remote sitemaps
///
/// # Returns
///
/// * `Ok(Vec<Url>)` - Canonical seeds in source order, without duplicates
/// * `Err(DiscoveryError)` - A malformed seed, an unreadable seed file or
///   sitemap, or no seeds at all
pub async fn collect_seeds(
    config: &Config,
    client: &reqwest::Client,
) -> Result<Vec<Url>, DiscoveryError> {
    let policy = config.filter.query;
    let mut seeds = SeedList::default();

    for raw in &config.crawl.seeds {
        seeds.push(parse_seed(raw, policy)?);
    }

    if let Some(path) = &config.crawl.seed_file {
        let listed = read_seed_file(Path::new(path), policy)?;
        tracing::info!("Loaded {} seed(s) from {}", listed.len(), path);
        for url in listed {
            seeds.push(url);
        }
    }

    if let Some(location) = &config.crawl.sitemap {
        let filter = LinkFilter::from_config(&config.filter);
        let entries = load_sitemap(location, client).await?;
        let found = entries.len();
        let mut kept = 0;

        for entry in entries {
            let url = match canonicalize_str(&entry, policy) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Ignoring sitemap entry {}: {}", entry, e);
                    continue;
                }
            };
            if filter.allows(&url, &url) {
                kept += 1;
                seeds.push(url);
            }
        }

        tracing::info!("Sitemap {}: kept {} of {} entries", location, kept, found);
    }

    if seeds.urls.is_empty() {
        return Err(DiscoveryError::NoSeeds);
    }

    Ok(seeds.urls)
}

#[derive(Default)]
struct SeedList {
    seen: HashSet<String>,
    urls: Vec<Url>,
}

impl SeedList {
    fn push(&mut self, url: Url) {
        if self.seen.insert(url.as_str().to_string()) {
            self.urls.push(url);
        }
    }
}

fn parse_seed(raw: &str, policy: QueryPolicy) -> Result<Url, DiscoveryError> {
    canonicalize_str(raw, policy).map_err(|e| DiscoveryError::InvalidSeed {
        seed: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Parses seed-file content: one URL per line, blank lines and `#` comments ignored
pub fn parse_seed_lines(content: &str, policy: QueryPolicy) -> Result<Vec<Url>, DiscoveryError> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(|line| parse_seed(line, policy))
        .collect()
}

/// Reads and parses a seed file
pub fn read_seed_file(path: &Path, policy: QueryPolicy) -> Result<Vec<Url>, DiscoveryError> {
    let content = std::fs::read_to_string(path).map_err(|source| DiscoveryError::SeedFile {
        path: path.display().to_string(),
        source,
    })?;
    parse_seed_lines(&content, policy)
}

/// Reads a sitemap and every sitemap it references
///
/// Returns the page locations in document order. Nested sitemaps are always
/// remote; only the top-level location may be a local path.
pub async fn load_sitemap(
    location: &str,
    client: &reqwest::Client,
) -> Result<Vec<String>, DiscoveryError> {
    let mut entries = Vec::new();
    let mut pending = vec![location.to_string()];
    let mut visited = HashSet::new();

    while let Some(current) = pending.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        if visited.len() > MAX_SITEMAP_DOCUMENTS {
            tracing::warn!(
                "Stopping after {} sitemap documents",
                MAX_SITEMAP_DOCUMENTS
            );
            break;
        }

        let content = read_sitemap_document(&current, client).await?;
        let parsed = parse_sitemap(&content);

        if parsed.is_empty() && parsed.errors > 0 {
            return Err(DiscoveryError::Sitemap {
                location: current,
                reason: "document is not a valid sitemap".to_string(),
            });
        }

        tracing::debug!(
            "Sitemap {}: {} page(s), {} nested sitemap(s)",
            current,
            parsed.pages.len(),
            parsed.sitemaps.len()
        );

        entries.extend(parsed.pages);
        // Reverse so nested sitemaps are read in listed order
        pending.extend(parsed.sitemaps.into_iter().rev());
    }

    Ok(entries)
}

/// Locations found in one sitemap document
#[derive(Debug, Default, PartialEq, Eq)]
struct ParsedSitemap {
    pages: Vec<String>,
    sitemaps: Vec<String>,
    errors: usize,
}

impl ParsedSitemap {
    fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.sitemaps.is_empty()
    }
}

fn parse_sitemap(content: &[u8]) -> ParsedSitemap {
    let mut parsed = ParsedSitemap::default();

    for entity in SiteMapReader::new(content) {
        match entity {
            SiteMapEntity::Url(entry) => {
                if let Location::Url(url) = entry.loc {
                    parsed.pages.push(url.to_string());
                }
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Location::Url(url) = entry.loc {
                    parsed.sitemaps.push(url.to_string());
                }
            }
            SiteMapEntity::Err(e) => {
                tracing::debug!("Sitemap parse error: {:?}", e);
                parsed.errors += 1;
            }
        }
    }

    parsed
}

async fn read_sitemap_document(
    location: &str,
    client: &reqwest::Client,
) -> Result<Vec<u8>, DiscoveryError> {
    let failed = |reason: String| DiscoveryError::Sitemap {
        location: location.to_string(),
        reason,
    };

    if location.starts_with("http://") || location.starts_with("https://") {
        let response = client
            .get(location)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| failed(e.to_string()))?;
        let body = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        Ok(body.to_vec())
    } else {
        tokio::fs::read(location)
            .await
            .map_err(|e| failed(e.to_string()))
    }
}
