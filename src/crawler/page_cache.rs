//! Per-run page cache guaranteeing at most one fetch per canonical URL

use super::fetcher::FetchedPage;
use crate::FetchError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use url::Url;

/// A fetched page held for the lifetime of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    /// Canonical URL the page was requested under
    pub url: Url,

    /// URL the content was finally served from
    pub final_url: Url,

    /// Raw page content
    pub raw_content: String,

    /// HTTP status code
    pub status: u16,

    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
}

type Slot = Arc<OnceCell<Result<Arc<CachedPage>, FetchError>>>;

/// Cache of fetch outcomes keyed by canonical URL
///
/// The first caller for a URL runs the fetch; concurrent callers for the same
/// URL wait for that fetch instead of starting their own. A failed fetch is
/// remembered too, so a URL is never requested twice in one run.
#[derive(Debug, Default)]
pub struct PageCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl PageCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached outcome for `url`, fetching it first if needed
    ///
    /// # Arguments
    ///
    /// * `url` - The canonical URL
    /// * `fetch` - Called at most once per URL over the cache's lifetime
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<CachedPage>)` - The page, freshly fetched or from the cache
    /// * `Err(FetchError)` - The first fetch failed; the failure is replayed
    pub async fn get_or_fetch<F, Fut>(
        &self,
        url: &Url,
        fetch: F,
    ) -> Result<Arc<CachedPage>, FetchError>
    where
        F: FnOnce(Url) -> Fut,
        Fut: Future<Output = Result<FetchedPage, FetchError>>,
    {
        // The map lock is never held across the fetch itself
        let slot = Arc::clone(self.lock().entry(url.as_str().to_string()).or_default());

        let outcome = slot
            .get_or_init(|| async {
                tracing::debug!("Cache miss, fetching {}", url);
                fetch(url.clone()).await.map(|page| {
                    Arc::new(CachedPage {
                        url: url.clone(),
                        final_url: page.final_url,
                        raw_content: page.body,
                        status: page.status,
                        fetched_at: Utc::now(),
                    })
                })
            })
            .await;

        outcome.clone()
    }

    /// Returns a successfully cached page without fetching
    pub fn get(&self, url: &Url) -> Option<Arc<CachedPage>> {
        let slot = self.lock().get(url.as_str()).cloned()?;
        match slot.get() {
            Some(Ok(page)) => Some(Arc::clone(page)),
            _ => None,
        }
    }

    /// Returns true if a fetch for `url` has completed, successfully or not
    pub fn was_attempted(&self, url: &Url) -> bool {
        self.lock()
            .get(url.as_str())
            .map_or(false, |slot| slot.initialized())
    }

    /// Canonical URLs of successfully cached pages, sorted
    pub fn urls(&self) -> Vec<Url> {
        let mut urls: Vec<Url> = self
            .lock()
            .values()
            .filter_map(|slot| match slot.get() {
                Some(Ok(page)) => Some(page.url.clone()),
                _ => None,
            })
            .collect();
        urls.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        urls
    }

    /// Number of successfully cached pages
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| matches!(slot.get(), Some(Ok(_))))
            .count()
    }

    /// Returns whether no page is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
