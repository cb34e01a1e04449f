//! Crawler module for fetching pages and driving a harvest
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier of canonical URLs and their lifecycle
//! - HTTP fetching behind the [`FetchClient`] seam
//! - A fetch-once page cache shared by all workers
//! - Link discovery from fetched pages
//! - The worker pool that ties it together

mod discover;
mod fetcher;
mod frontier;
mod harvester;
mod page_cache;

pub use discover::LinkDiscoverer;
pub use fetcher::{
    build_http_client, classify_status, user_agent_string, FetchClient, FetchedPage,
    HttpFetchClient,
};
pub use frontier::{ClaimedUrl, Frontier, FrontierCounts, FrontierEntry};
pub use harvester::{HarvestOutcome, Harvester};
pub use page_cache::{CachedPage, PageCache};
