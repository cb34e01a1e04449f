//! Harvest orchestration
//!
//! A harvest runs a fixed pool of workers over one shared frontier. Each
//! worker loops:
//!
//! 1. Waits out its own politeness delay
//! 2. Claims the next queued URL
//! 3. Fetches it through the page cache, bounded by the fetch deadline
//! 4. Enqueues the in-scope links of the page
//! 5. Extracts the page and hands the document to the sequencer
//! 6. Marks the URL complete
//!
//! Per-URL failures are recorded in the run summary and never abort the run.
//! Only corpus write errors and frontier bookkeeping errors do.

use super::discover::LinkDiscoverer;
use super::fetcher::{FetchClient, HttpFetchClient};
use super::frontier::{ClaimedUrl, Frontier};
use super::page_cache::{CachedPage, PageCache};
use crate::config::{Config, OutputOrder};
use crate::extract::{BlockExtractor, Document};
use crate::output::{DocumentAssembler, FailedUrl, RunSummary, Sequencer, SkippedUrl};
use crate::state::WorkerState;
use crate::url::canonicalize;
use crate::{DiscoveryError, FetchError, ScribeError};
use chrono::Utc;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Result of a finished harvest
#[derive(Debug)]
pub struct HarvestOutcome<W> {
    /// Counts and per-URL problems of the run
    pub summary: RunSummary,

    /// The corpus sink, flushed
    pub sink: W,
}

/// Crawls a documentation site and streams its pages into a corpus
///
/// All behaviour is driven by the [`Config`] passed at construction; the
/// network is reached only through the given [`FetchClient`].
pub struct Harvester {
    config: Config,
    client: Arc<dyn FetchClient>,
}

#[derive(Debug, Default)]
struct Report {
    fetched: usize,
    failures: Vec<(u64, FailedUrl)>,
    skips: Vec<SkippedUrl>,
}

/// State shared by all workers of one run
struct Shared<W: Write> {
    frontier: Frontier,
    cache: PageCache,
    discoverer: LinkDiscoverer,
    extractor: BlockExtractor,
    client: Arc<dyn FetchClient>,
    order: OutputOrder,
    politeness: Duration,
    fetch_timeout: Duration,
    sequencer: Mutex<Sequencer<W>>,
    report: Mutex<Report>,
    work_ready: Notify,
    cancel: CancellationToken,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Harvester {
    /// Creates a harvester with an explicit fetch client
    pub fn new(config: Config, client: Arc<dyn FetchClient>) -> Self {
        Self { config, client }
    }

    /// Creates a harvester fetching over HTTP with the configured user agent
    pub fn with_http_client(config: Config) -> Result<Self, ScribeError> {
        let client = HttpFetchClient::new(
            &config.user_agent,
            Duration::from_millis(config.crawl.fetch_timeout),
        )?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Returns the configuration this harvester runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one harvest to completion or cancellation
    ///
    /// # Arguments
    ///
    /// * `seeds` - Start URLs; canonicalized and enqueued in the given order
    /// * `sink` - Where the corpus is written
    /// * `cancel` - Cancelling stops new claims; the partial corpus is flushed
    ///   with a truncation notice
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestOutcome)` - The run summary and the flushed sink
    /// * `Err(ScribeError)` - No seeds, an invalid seed, or a corpus write failure
    pub async fn run<W>(
        &self,
        seeds: Vec<Url>,
        sink: W,
        cancel: CancellationToken,
    ) -> Result<HarvestOutcome<W>, ScribeError>
    where
        W: Write + Send + 'static,
    {
        let started = Instant::now();
        let policy = self.config.filter.query;

        let seeds = seeds
            .iter()
            .map(|seed| canonicalize(seed, policy))
            .collect::<Result<Vec<_>, _>>()?;
        let source = seeds.first().ok_or(DiscoveryError::NoSeeds)?.to_string();

        let mut assembler = DocumentAssembler::new(sink);
        assembler.write_header(&self.config.output.title, &source, Utc::now())?;

        let shared = Arc::new(Shared {
            frontier: Frontier::with_max_pages(self.config.crawl.max_pages),
            cache: PageCache::new(),
            discoverer: LinkDiscoverer::from_config(&self.config.filter),
            extractor: BlockExtractor::new(&self.config.extract),
            client: Arc::clone(&self.client),
            order: self.config.output.order,
            politeness: Duration::from_millis(self.config.crawl.politeness_delay),
            fetch_timeout: Duration::from_millis(self.config.crawl.fetch_timeout),
            sequencer: Mutex::new(Sequencer::new(assembler)),
            report: Mutex::new(Report::default()),
            work_ready: Notify::new(),
            cancel: cancel.child_token(),
        });

        for seed in seeds {
            shared.frontier.enqueue(seed, None);
        }

        let workers = self.config.crawl.max_concurrency.max(1) as usize;
        tracing::info!(
            "Starting harvest with {} worker(s) from {} seed(s)",
            workers,
            shared.frontier.len()
        );

        let mut tasks = JoinSet::new();
        for id in 0..workers {
            tasks.spawn(worker(id, Arc::clone(&shared)));
        }

        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined
                .map_err(|e| ScribeError::Worker(e.to_string()))
                .and_then(|r| r);

            if let Err(e) = result {
                if failure.is_none() {
                    tracing::error!("Harvest aborted: {}", e);
                    shared.cancel.cancel();
                    failure = Some(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let Shared {
            frontier,
            cache,
            extractor,
            order,
            sequencer,
            report,
            ..
        } = Arc::try_unwrap(shared)
            .map_err(|_| ScribeError::Worker("harvest state still shared".to_string()))?;

        let truncated = !frontier.is_settled();
        if truncated {
            tracing::warn!("Harvest cancelled with URLs still queued");
        }

        let mut sequencer = sequencer.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut report = report.into_inner().unwrap_or_else(PoisonError::into_inner);

        sequencer.drain()?;
        let mut assembler = sequencer.into_assembler();

        if order == OutputOrder::CanonicalSort {
            append_sorted(&cache, &extractor, &mut assembler, &mut report.skips)?;
        }
        assembler.finish(truncated)?;

        let counts = frontier.counts();
        let mut failures = report.failures;
        failures.sort_by_key(|(sequence, _)| *sequence);

        let mut skips = report.skips;
        if let Some(max) = self.config.crawl.max_pages {
            skips.extend(frontier.refused().into_iter().map(|url| SkippedUrl {
                url,
                reason: format!("page cap of {} reached", max),
            }));
        }

        let summary = RunSummary {
            discovered: counts.discovered(),
            fetched: report.fetched,
            extracted: assembler.documents_written(),
            failed: counts.failed,
            skipped: skips.len(),
            failures: failures.into_iter().map(|(_, f)| f).collect(),
            skips,
            truncated,
            duration: started.elapsed(),
        };

        tracing::info!(
            "Harvest completed: {} discovered, {} fetched, {} extracted, {} failed, {} skipped in {:?}",
            summary.discovered,
            summary.fetched,
            summary.extracted,
            summary.failed,
            summary.skipped,
            summary.duration
        );

        Ok(HarvestOutcome {
            summary,
            sink: assembler.into_inner(),
        })
    }
}

/// Extracts every cached page in canonical URL order
fn append_sorted<W: Write>(
    cache: &PageCache,
    extractor: &BlockExtractor,
    assembler: &mut DocumentAssembler<W>,
    skips: &mut Vec<SkippedUrl>,
) -> Result<(), ScribeError> {
    for url in cache.urls() {
        let Some(page) = cache.get(&url) else {
            continue;
        };

        match extractor.extract(&url, &page.raw_content) {
            Ok(document) => assembler.append(&document)?,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", url, e);
                skips.push(SkippedUrl {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// One fetch worker; returns when the frontier settles or the run is cancelled
async fn worker<W>(id: usize, shared: Arc<Shared<W>>) -> Result<(), ScribeError>
where
    W: Write + Send + 'static,
{
    let mut pacing = WorkerState::new(shared.politeness);
    tracing::debug!("Worker {} started", id);

    loop {
        if let Some(wait) = pacing.time_until_next_request(Instant::now()) {
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shared.cancel.cancelled() => break,
            }
        }
        if shared.cancel.is_cancelled() {
            break;
        }

        // Register for wakeups before looking at the frontier so none is missed
        let notified = shared.work_ready.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let Some(claimed) = shared.frontier.claim() else {
            if shared.frontier.is_settled() {
                shared.work_ready.notify_waiters();
                break;
            }
            tokio::select! {
                _ = &mut notified => {}
                _ = shared.cancel.cancelled() => break,
            }
            continue;
        };

        pacing.record_request(Instant::now());
        shared.process(claimed).await?;
    }

    tracing::debug!(
        "Worker {} finished after {} request(s)",
        id,
        pacing.request_count
    );
    Ok(())
}

impl<W: Write> Shared<W> {
    /// Fetches, discovers, extracts and completes one claimed URL
    async fn process(&self, claimed: ClaimedUrl) -> Result<(), ScribeError> {
        let ClaimedUrl { url, sequence } = claimed;
        tracing::debug!("Processing URL: {}", url);

        let client = Arc::clone(&self.client);
        let deadline = self.fetch_timeout;
        let outcome = self
            .cache
            .get_or_fetch(&url, |target| async move {
                match tokio::time::timeout(deadline, client.fetch(&target)).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Transient {
                        url: target.to_string(),
                        reason: format!("fetch exceeded {}ms deadline", deadline.as_millis()),
                    }),
                }
            })
            .await;

        match outcome {
            Ok(page) => {
                self.record_fetched();
                self.enqueue_links(&url, &page);

                if self.order == OutputOrder::Discovery {
                    let document = self.extract(&url, &page);
                    lock(&self.sequencer).submit(sequence, document)?;
                }
                self.frontier.complete(&url, true)?;
            }
            Err(error) => {
                tracing::warn!("Failed to fetch {}: {}", url, error);
                lock(&self.report).failures.push((
                    sequence,
                    FailedUrl {
                        url: url.to_string(),
                        reason: error.to_string(),
                        transient: error.is_transient(),
                    },
                ));

                if self.order == OutputOrder::Discovery {
                    lock(&self.sequencer).submit(sequence, None)?;
                }
                self.frontier.complete(&url, false)?;
            }
        }

        // Completion may settle the frontier; idle workers re-check
        self.work_ready.notify_waiters();
        Ok(())
    }

    fn record_fetched(&self) {
        let fetched = {
            let mut report = lock(&self.report);
            report.fetched += 1;
            report.fetched
        };

        if fetched % 10 == 0 {
            let counts = self.frontier.counts();
            tracing::info!(
                "Progress: {} pages fetched, {} queued, {} failed",
                fetched,
                counts.queued,
                counts.failed
            );
        }
    }

    fn enqueue_links(&self, url: &Url, page: &CachedPage) {
        let links = self.discoverer.discover(&page.final_url, &page.raw_content);
        let found = links.len();
        let added = links
            .into_iter()
            .filter(|link| self.frontier.enqueue(link.clone(), Some(url)))
            .count();

        tracing::debug!("{}: {} in-scope links, {} new", url, found, added);
        if added > 0 {
            self.work_ready.notify_waiters();
        }
    }

    fn extract(&self, url: &Url, page: &CachedPage) -> Option<Document> {
        match self.extractor.extract(url, &page.raw_content) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", url, e);
                lock(&self.report).skips.push(SkippedUrl {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}
