//! The crawl frontier: a FIFO queue of canonical URLs plus the seen-set
//!
//! Every canonical URL enters the frontier at most once and then moves through
//! `Queued -> Fetching -> Done | Failed`. The frontier is shared by all workers
//! of a harvest, so every operation takes the internal lock.

use crate::state::PageState;
use crate::ScribeError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// Bookkeeping for one frontier entry
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    /// The canonical URL
    pub url: Url,

    /// The page this URL was first discovered on; `None` for seeds
    pub discovered_from: Option<Url>,

    /// Discovery ordinal; seeds and links are numbered in enqueue order
    pub sequence: u64,

    /// Current lifecycle state
    pub state: PageState,
}

/// A URL handed to a worker by [`Frontier::claim`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedUrl {
    /// The canonical URL
    pub url: Url,

    /// Discovery ordinal of the entry
    pub sequence: u64,
}

/// Number of entries in each state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierCounts {
    pub queued: usize,
    pub fetching: usize,
    pub done: usize,
    pub failed: usize,
    /// Distinct URLs refused because the page cap was reached
    pub refused: usize,
}

impl FrontierCounts {
    /// Total number of URLs ever accepted
    pub fn discovered(&self) -> usize {
        self.queued + self.fetching + self.done + self.failed
    }
}

#[derive(Debug, Default)]
struct FrontierInner {
    entries: HashMap<String, FrontierEntry>,
    queue: VecDeque<String>,
    next_sequence: u64,
    refused: Vec<String>,
}

/// Thread-safe crawl frontier
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    max_pages: Option<usize>,
}

impl Frontier {
    /// Creates an empty, uncapped frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier that accepts at most `max_pages` URLs
    pub fn with_max_pages(max_pages: Option<usize>) -> Self {
        Self {
            inner: Mutex::default(),
            max_pages,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a canonical URL to the queue unless it is already known
    ///
    /// # Arguments
    ///
    /// * `url` - The canonical URL
    /// * `parent` - The page it was discovered on, `None` for seeds
    ///
    /// # Returns
    ///
    /// `true` if the URL was newly queued. Known URLs, in any state, are a
    /// silent no-op, as are URLs refused by the page cap.
    pub fn enqueue(&self, url: Url, parent: Option<&Url>) -> bool {
        let mut inner = self.lock();
        let key = url.as_str().to_string();

        if inner.entries.contains_key(&key) {
            return false;
        }

        if let Some(max) = self.max_pages {
            if inner.entries.len() >= max {
                if !inner.refused.contains(&key) {
                    inner.refused.push(key);
                }
                tracing::debug!("Page cap of {} reached, not queueing {}", max, url);
                return false;
            }
        }

        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        inner.entries.insert(
            key.clone(),
            FrontierEntry {
                url,
                discovered_from: parent.cloned(),
                sequence,
                state: PageState::Queued,
            },
        );
        inner.queue.push_back(key);
        true
    }

    /// Hands out the oldest queued URL and marks it Fetching
    ///
    /// Returns `None` when nothing is queued; entries still being fetched may
    /// add more work later, see [`is_settled`](Self::is_settled).
    pub fn claim(&self) -> Option<ClaimedUrl> {
        let mut inner = self.lock();

        while let Some(key) = inner.queue.pop_front() {
            if let Some(entry) = inner.entries.get_mut(&key) {
                if entry.state == PageState::Queued {
                    entry.state = PageState::Fetching;
                    return Some(ClaimedUrl {
                        url: entry.url.clone(),
                        sequence: entry.sequence,
                    });
                }
            }
        }

        None
    }

    /// Moves a Fetching entry to Done or Failed
    ///
    /// # Errors
    ///
    /// * `ScribeError::UnknownUrl` - The URL was never enqueued
    /// * `ScribeError::InvalidTransition` - The entry is not Fetching
    pub fn complete(&self, url: &Url, success: bool) -> Result<(), ScribeError> {
        let mut inner = self.lock();
        let entry = inner
            .entries
            .get_mut(url.as_str())
            .ok_or_else(|| ScribeError::UnknownUrl {
                url: url.to_string(),
            })?;

        let next = if success {
            PageState::Done
        } else {
            PageState::Failed
        };

        if !entry.state.can_transition_to(next) {
            return Err(ScribeError::InvalidTransition {
                url: url.to_string(),
                from: entry.state,
                to: next,
            });
        }

        entry.state = next;
        Ok(())
    }

    /// Returns the state of a URL, if known
    pub fn state(&self, url: &Url) -> Option<PageState> {
        self.lock().entries.get(url.as_str()).map(|e| e.state)
    }

    /// True once nothing is queued and nothing is being fetched
    pub fn is_settled(&self) -> bool {
        self.lock()
            .entries
            .values()
            .all(|e| e.state.is_terminal())
    }

    /// Number of entries per state
    pub fn counts(&self) -> FrontierCounts {
        let inner = self.lock();
        let mut counts = FrontierCounts {
            refused: inner.refused.len(),
            ..FrontierCounts::default()
        };

        for entry in inner.entries.values() {
            match entry.state {
                PageState::Queued => counts.queued += 1,
                PageState::Fetching => counts.fetching += 1,
                PageState::Done => counts.done += 1,
                PageState::Failed => counts.failed += 1,
            }
        }

        counts
    }

    /// Failed entries in discovery order
    pub fn failed(&self) -> Vec<FrontierEntry> {
        let inner = self.lock();
        let mut failed: Vec<FrontierEntry> = inner
            .entries
            .values()
            .filter(|e| e.state == PageState::Failed)
            .cloned()
            .collect();
        failed.sort_by_key(|e| e.sequence);
        failed
    }

    /// URLs refused by the page cap, in the order they were first refused
    pub fn refused(&self) -> Vec<String> {
        self.lock().refused.clone()
    }

    /// Returns the number of URLs ever accepted
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns whether no URL was ever accepted
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}
