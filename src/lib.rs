//! Sumi-Scribe: a documentation corpus harvester
//!
//! This crate crawls a documentation site from a set of seed URLs, visiting every
//! in-scope page exactly once, and flattens each page into an ordered sequence of
//! semantic text blocks. The blocks are streamed into a single text corpus meant
//! for consumption by language models.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod seeds;
pub mod state;
pub mod url;

use thiserror::Error;

/// Run-level error type for Sumi-Scribe operations
///
/// Only these errors abort a harvest. Per-page problems ([`FetchError`],
/// [`ExtractionError`]) are recorded in the run summary instead.
#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to write corpus: {0}")]
    Assembly(#[from] std::io::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition for {url}: {from:?} -> {to:?}")]
    InvalidTransition {
        url: String,
        from: state::PageState,
        to: state::PageState,
    },

    #[error("URL was never enqueued: {url}")]
    UnknownUrl { url: String },

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Per-URL fetch failure
///
/// The split between transient and permanent failures is part of the fetch
/// boundary contract: transient failures are eligible for an external retry
/// pass, permanent ones are not. Neither is retried inside a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transient failure for {url}: {reason}")]
    Transient { url: String, reason: String },

    #[error("permanent failure for {url}: {reason}")]
    Permanent { url: String, reason: String },
}

impl FetchError {
    /// Returns the URL the failure belongs to
    pub fn url(&self) -> &str {
        match self {
            Self::Transient { url, .. } | Self::Permanent { url, .. } => url,
        }
    }

    /// Returns true if a later run could reasonably succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Per-URL extraction failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no content region matched [{selectors}] on {url}")]
    NoContentRoot { url: String, selectors: String },

    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Seed and link-source errors; these abort a run before any page is fetched
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid seed URL '{seed}': {reason}")]
    InvalidSeed { seed: String, reason: String },

    #[error("Failed to read seed file {path}: {source}")]
    SeedFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to load sitemap {location}: {reason}")]
    Sitemap { location: String, reason: String },

    #[error("No seed URLs remain after filtering")]
    NoSeeds,
}

/// Result type alias for Sumi-Scribe operations
pub type Result<T> = std::result::Result<T, ScribeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::url::{canonicalize, QueryPolicy};
pub use config::Config;
pub use crawler::Harvester;
pub use extract::{Block, Document};
pub use output::RunSummary;
pub use state::PageState;
