//! Integration tests for the harvester
//!
//! The HTTP tests use wiremock to serve a small documentation site and run
//! the full fetch, discover, extract and assemble cycle end-to-end. The
//! concurrency tests use an in-memory fetch client with per-page delays so
//! completion order can be forced.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_scribe::config::{
    load_config, Config, CrawlConfig, ExtractConfig, FilterConfig, OutputConfig, OutputOrder,
    UserAgentConfig,
};
use sumi_scribe::crawler::{FetchClient, FetchedPage};
use sumi_scribe::output::TRUNCATION_NOTICE;
use sumi_scribe::seeds::collect_seeds;
use sumi_scribe::{FetchError, Harvester};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration harvesting `/docs/` from the given seeds
fn create_test_config(seeds: Vec<String>, max_concurrency: u32) -> Config {
    Config {
        crawl: CrawlConfig {
            seeds,
            seed_file: None,
            sitemap: None,
            max_concurrency,
            politeness_delay: 50,
            fetch_timeout: 2000,
            max_pages: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: Some("https://example.com/contact".to_string()),
        },
        filter: FilterConfig {
            include_prefixes: vec!["/docs/".to_string()],
            ..FilterConfig::default()
        },
        extract: ExtractConfig::default(),
        output: OutputConfig {
            path: "corpus.txt".to_string(),
            title: "Test Docs".to_string(),
            order: OutputOrder::Discovery,
        },
    }
}

fn html_page(title: &str, links: &[&str]) -> String {
    let links: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        "<html><head><title>{0}</title></head><body><main><h1>{0}</h1><p>{0} text.</p>{1}</main></body></html>",
        title, links
    )
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

/// Source lines of the documents in a corpus, skipping the corpus header
fn document_sources(corpus: &str) -> Vec<String> {
    corpus
        .lines()
        .filter_map(|line| line.strip_prefix("Source: "))
        .skip(1)
        .map(str::to_string)
        .collect()
}

/// In-memory site with per-page latency and a fetch counter
#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, (Duration, String)>,
    hits: Mutex<HashMap<String, usize>>,
    cancel_on: Option<(String, CancellationToken)>,
}

impl FakeSite {
    fn page(mut self, url: &str, delay_ms: u64, body: String) -> Self {
        self.pages
            .insert(url.to_string(), (Duration::from_millis(delay_ms), body));
        self
    }

    fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl FetchClient for FakeSite {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        *self
            .hits
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        if let Some((target, token)) = &self.cancel_on {
            if target == url.as_str() {
                token.cancel();
            }
        }

        match self.pages.get(url.as_str()) {
            Some((delay, body)) => {
                tokio::time::sleep(*delay).await;
                Ok(FetchedPage {
                    final_url: url.clone(),
                    status: 200,
                    body: body.clone(),
                })
            }
            None => Err(FetchError::Permanent {
                url: url.to_string(),
                reason: "HTTP 404".to_string(),
            }),
        }
    }
}

fn seeds(urls: &[&str]) -> Vec<Url> {
    urls.iter().map(|u| Url::parse(u).unwrap()).collect()
}

#[tokio::test]
async fn test_http_harvest_stays_in_scope() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/docs/a"))
        .respond_with(html_response(html_page(
            "Page A",
            &["/docs/b#frag", "/blog/c", "/docs/a"],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/b"))
        .respond_with(html_response(html_page("Page B", &["/docs/a"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blog/c"))
        .respond_with(html_response(html_page("Blog C", &[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let seed = format!("{}/docs/a", base_url);
    let config = create_test_config(vec![seed.clone()], 2);
    let harvester = Harvester::with_http_client(config).unwrap();

    let outcome = harvester
        .run(seeds(&[&seed]), Vec::new(), CancellationToken::new())
        .await
        .unwrap();

    let corpus = String::from_utf8(outcome.sink).unwrap();
    assert_eq!(
        document_sources(&corpus),
        vec![format!("{}/docs/a", base_url), format!("{}/docs/b", base_url)]
    );
    assert!(corpus.contains("# Page A\n"));
    assert!(corpus.contains("Page B text."));
    assert!(!corpus.contains("Blog C"));

    let summary = outcome.summary;
    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.extracted, 2);
    assert!(summary.is_clean());
}

#[tokio::test]
async fn test_http_failures_are_classified() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/docs/index"))
        .respond_with(html_response(html_page(
            "Index",
            &["/docs/gone", "/docs/busy", "/docs/manual.pdf"],
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/busy"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/manual.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0x25_u8, 0x50, 0x44, 0x46], "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let seed = format!("{}/docs/index", base_url);
    let harvester = Harvester::with_http_client(create_test_config(vec![seed.clone()], 1)).unwrap();

    let outcome = harvester
        .run(seeds(&[&seed]), Vec::new(), CancellationToken::new())
        .await
        .unwrap();

    let summary = outcome.summary;
    assert_eq!(summary.discovered, 4);
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.failed, 3);

    let transient: HashMap<String, bool> = summary
        .failures
        .iter()
        .map(|f| (f.url.clone(), f.transient))
        .collect();
    assert_eq!(transient[&format!("{}/docs/gone", base_url)], false);
    assert_eq!(transient[&format!("{}/docs/busy", base_url)], true);
    assert_eq!(transient[&format!("{}/docs/manual.pdf", base_url)], false);

    // Failures are listed in discovery order
    let urls: Vec<&str> = summary.failures.iter().map(|f| f.url.as_str()).collect();
    assert!(urls[0].ends_with("/docs/gone"));
    assert!(urls[2].ends_with("/docs/manual.pdf"));
}

#[tokio::test]
async fn test_shared_link_fetched_once() {
    let site = Arc::new(
        FakeSite::default()
            .page(
                "https://x.dev/docs/a",
                30,
                html_page("A", &["/docs/shared"]),
            )
            .page(
                "https://x.dev/docs/b",
                30,
                html_page("B", &["/docs/shared"]),
            )
            .page("https://x.dev/docs/shared", 0, html_page("Shared", &[])),
    );

    let harvester = Harvester::new(create_test_config(vec![], 2), site.clone());
    let outcome = harvester
        .run(
            seeds(&["https://x.dev/docs/a", "https://x.dev/docs/b"]),
            Vec::new(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(site.hits("https://x.dev/docs/shared"), 1);
    assert_eq!(outcome.summary.discovered, 3);

    let corpus = String::from_utf8(outcome.sink).unwrap();
    let shared = document_sources(&corpus)
        .into_iter()
        .filter(|s| s == "https://x.dev/docs/shared")
        .count();
    assert_eq!(shared, 1);
}

#[tokio::test]
async fn test_discovery_order_survives_concurrency() {
    let site = Arc::new(
        FakeSite::default()
            .page("https://x.dev/docs/a", 150, html_page("A", &[]))
            .page("https://x.dev/docs/b", 0, html_page("B", &[]))
            .page("https://x.dev/docs/c", 0, html_page("C", &[])),
    );

    let harvester = Harvester::new(create_test_config(vec![], 3), site);
    let outcome = harvester
        .run(
            seeds(&[
                "https://x.dev/docs/a",
                "https://x.dev/docs/b",
                "https://x.dev/docs/c",
            ]),
            Vec::new(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let corpus = String::from_utf8(outcome.sink).unwrap();
    assert_eq!(
        document_sources(&corpus),
        vec![
            "https://x.dev/docs/a",
            "https://x.dev/docs/b",
            "https://x.dev/docs/c"
        ]
    );
}

#[tokio::test]
async fn test_canonical_sort_order() {
    let site = Arc::new(
        FakeSite::default()
            .page("https://x.dev/docs/c", 0, html_page("C", &["/docs/a"]))
            .page("https://x.dev/docs/a", 0, html_page("A", &["/docs/b"]))
            .page("https://x.dev/docs/b", 0, html_page("B", &[])),
    );

    let mut config = create_test_config(vec![], 2);
    config.output.order = OutputOrder::CanonicalSort;

    let harvester = Harvester::new(config, site);
    let outcome = harvester
        .run(
            seeds(&["https://x.dev/docs/c"]),
            Vec::new(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let corpus = String::from_utf8(outcome.sink).unwrap();
    assert_eq!(
        document_sources(&corpus),
        vec![
            "https://x.dev/docs/a",
            "https://x.dev/docs/b",
            "https://x.dev/docs/c"
        ]
    );
    assert_eq!(outcome.summary.extracted, 3);
}

#[tokio::test]
async fn test_page_without_content_root_is_skipped() {
    let site = Arc::new(
        FakeSite::default()
            .page("https://x.dev/docs/a", 0, html_page("A", &["/docs/raw"]))
            .page(
                "https://x.dev/docs/raw",
                0,
                "<html><body><div><p>No region here.</p></div></body></html>".to_string(),
            ),
    );

    let harvester = Harvester::new(create_test_config(vec![], 1), site);
    let outcome = harvester
        .run(
            seeds(&["https://x.dev/docs/a"]),
            Vec::new(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let summary = outcome.summary;
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.skips[0].url, "https://x.dev/docs/raw");
    assert!(summary.skips[0].reason.contains("no content region"));

    let corpus = String::from_utf8(outcome.sink).unwrap();
    assert!(!corpus.contains("No region here."));
}

#[tokio::test]
async fn test_slow_fetch_is_transient_failure() {
    let site = Arc::new(
        FakeSite::default()
            .page(
                "https://x.dev/docs/a",
                0,
                html_page("A", &["/docs/slow", "/docs/b"]),
            )
            .page("https://x.dev/docs/slow", 1000, html_page("Slow", &[]))
            .page("https://x.dev/docs/b", 0, html_page("B", &[])),
    );

    let mut config = create_test_config(vec![], 1);
    config.crawl.fetch_timeout = 100;

    let harvester = Harvester::new(config, site);
    let outcome = harvester
        .run(
            seeds(&["https://x.dev/docs/a"]),
            Vec::new(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let summary = outcome.summary;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].url, "https://x.dev/docs/slow");
    assert!(summary.failures[0].transient);
    assert!(summary.failures[0].reason.contains("deadline"));
    assert_eq!(summary.extracted, 2);
    assert!(!summary.truncated);

    let corpus = String::from_utf8(outcome.sink).unwrap();
    assert_eq!(
        document_sources(&corpus),
        vec!["https://x.dev/docs/a", "https://x.dev/docs/b"]
    );
}

#[tokio::test]
async fn test_cancellation_flushes_partial_corpus() {
    let cancel = CancellationToken::new();
    let site = FakeSite {
        cancel_on: Some(("https://x.dev/docs/a".to_string(), cancel.clone())),
        ..FakeSite::default()
    }
    .page("https://x.dev/docs/a", 0, html_page("A", &["/docs/b"]))
    .page("https://x.dev/docs/b", 0, html_page("B", &[]));
    let site = Arc::new(site);

    let harvester = Harvester::new(create_test_config(vec![], 1), site.clone());
    let outcome = harvester
        .run(seeds(&["https://x.dev/docs/a"]), Vec::new(), cancel)
        .await
        .unwrap();

    assert_eq!(site.hits("https://x.dev/docs/b"), 0);
    assert!(outcome.summary.truncated);
    assert_eq!(outcome.summary.extracted, 1);

    let corpus = String::from_utf8(outcome.sink).unwrap();
    assert_eq!(document_sources(&corpus), vec!["https://x.dev/docs/a"]);
    assert!(corpus.trim_end().ends_with(TRUNCATION_NOTICE));
}

#[tokio::test]
async fn test_config_file_to_corpus_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/docs/start"))
        .respond_with(html_response(
            r#"<html><body><nav><a href="/docs/nav-only">Nav</a></nav>
            <article><h1>Start</h1>
            <div class="admonition warning"><p class="admonition-title">Warning</p><p>Mind the gap.</p></div>
            <pre><code class="language-bash">npm install</code></pre>
            </article></body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let corpus_file = NamedTempFile::new().unwrap();
    let mut config_file = NamedTempFile::new().unwrap();
    write!(
        config_file,
        r#"
[crawl]
seeds = ["{base}/docs/start"]
politeness-delay = 50

[filter]
include-prefixes = ["/docs/"]
exclude-substrings = ["nav-only"]

[output]
path = "{out}"
title = "Start Docs"
"#,
        base = base_url,
        out = corpus_file.path().display()
    )
    .unwrap();

    let config = load_config(config_file.path()).unwrap();
    let client = reqwest::Client::new();
    let start = collect_seeds(&config, &client).await.unwrap();

    let sink = std::fs::File::create(&config.output.path).unwrap();
    let harvester = Harvester::with_http_client(config).unwrap();
    let outcome = harvester
        .run(start, std::io::BufWriter::new(sink), CancellationToken::new())
        .await
        .unwrap();
    drop(outcome.sink);

    assert_eq!(outcome.summary.discovered, 1);

    let corpus = std::fs::read_to_string(corpus_file.path()).unwrap();
    assert!(corpus.starts_with("# Start Docs\n"));
    assert!(corpus.contains("> **WARNING:** Mind the gap.\n"));
    assert!(corpus.contains("```bash\nnpm install\n```\n"));
    assert!(!corpus.contains("Nav"));
}
