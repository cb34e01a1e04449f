use crate::url::QueryPolicy;
use serde::Deserialize;

/// Main configuration structure for Sumi-Scribe
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed URLs to start harvesting from
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Optional newline-delimited file of additional seed URLs
    #[serde(rename = "seed-file", default)]
    pub seed_file: Option<String>,

    /// Optional sitemap (URL or local path) whose entries become seeds
    #[serde(default)]
    pub sitemap: Option<String>,

    /// Number of concurrent fetch workers
    #[serde(rename = "max-concurrency", default = "default_max_concurrency")]
    pub max_concurrency: u32,

    /// Minimum time between two fetches of the same worker (milliseconds)
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: u64,

    /// Deadline for a single fetch (milliseconds)
    #[serde(rename = "fetch-timeout", default = "default_fetch_timeout")]
    pub fetch_timeout: u64,

    /// Upper bound on the number of pages accepted into the frontier
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<usize>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

/// Link filtering configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Path (or absolute URL) prefixes a discovered link must start with
    #[serde(rename = "include-prefixes", default)]
    pub include_prefixes: Vec<String>,

    /// Substrings that disqualify a discovered link
    #[serde(rename = "exclude-substrings", default)]
    pub exclude_substrings: Vec<String>,

    /// What canonicalization does with query strings
    #[serde(default)]
    pub query: QueryPolicy,
}

/// Content extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    /// Candidate root selectors, tried in order
    #[serde(rename = "content-selectors", default = "default_content_selectors")]
    pub content_selectors: Vec<String>,

    /// Subtrees removed before block extraction
    #[serde(rename = "noise-selectors", default = "default_noise_selectors")]
    pub noise_selectors: Vec<String>,

    /// Class names that mark a callout container
    #[serde(rename = "admonition-classes", default = "default_admonition_classes")]
    pub admonition_classes: Vec<String>,

    /// Class names of the element holding a callout's label
    #[serde(
        rename = "admonition-title-classes",
        default = "default_admonition_title_classes"
    )]
    pub admonition_title_classes: Vec<String>,

    /// Language used for code blocks without a language class
    #[serde(rename = "default-code-language", default)]
    pub default_code_language: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the corpus file
    pub path: String,

    /// Title written at the top of the corpus
    pub title: String,

    /// Order in which pages appear in the corpus
    #[serde(default)]
    pub order: OutputOrder,
}

/// Order of documents in the corpus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputOrder {
    /// Breadth-first discovery order
    #[default]
    Discovery,
    /// Lexicographic order of canonical URLs
    CanonicalSort,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            content_selectors: default_content_selectors(),
            noise_selectors: default_noise_selectors(),
            admonition_classes: default_admonition_classes(),
            admonition_title_classes: default_admonition_title_classes(),
            default_code_language: None,
        }
    }
}

fn default_max_concurrency() -> u32 {
    1
}

fn default_politeness_delay() -> u64 {
    200
}

fn default_fetch_timeout() -> u64 {
    30_000
}

fn default_crawler_name() -> String {
    "SumiScribe".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_content_selectors() -> Vec<String> {
    vec!["article".to_string(), "main".to_string()]
}

fn default_noise_selectors() -> Vec<String> {
    ["nav", "footer", "script", "style", ".toc", ".edit-page-link"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_admonition_classes() -> Vec<String> {
    [
        "admonition",
        "admonitionblock",
        "custom-block",
        "alert",
        "callout",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_admonition_title_classes() -> Vec<String> {
    [
        "admonition-title",
        "custom-block-title",
        "alert-title",
        "icon",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
