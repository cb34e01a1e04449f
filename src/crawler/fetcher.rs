//! HTTP fetch boundary
//!
//! The harvester only talks to the network through [`FetchClient`]. The
//! production implementation, [`HttpFetchClient`], wraps a reqwest client and
//! classifies every failure as transient or permanent:
//!
//! | Condition | Classification |
//! |-----------|----------------|
//! | 2xx with an HTML body | Success |
//! | 2xx with a non-HTML Content-Type | Permanent |
//! | HTTP 408, 429 | Transient |
//! | HTTP 5xx | Transient |
//! | HTTP 404, 410, other 4xx | Permanent |
//! | Timeout, connection failure | Transient |
//! | Redirect loop / too many redirects | Permanent |

use crate::config::UserAgentConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed for one fetch
const MAX_REDIRECTS: usize = 10;

/// A successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status: u16,

    /// Page body content
    pub body: String,
}

/// Retrieves page content for a URL
///
/// Implementations must be idempotent (same URL, same content, barring
/// server-side changes) and must report transient and permanent failures
/// distinctly. Whether a fetch is a plain HTTP request or a rendered-browser
/// request is up to the implementation.
#[async_trait]
pub trait FetchClient: Send + Sync {
    /// Fetches one URL
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Deadline for a complete request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Formats the User-Agent header: `Name/Version` or `Name/Version (+ContactURL)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    match &config.contact_url {
        Some(contact) => format!(
            "{}/{} (+{})",
            config.crawler_name, config.crawler_version, contact
        ),
        None => format!("{}/{}", config.crawler_name, config.crawler_version),
    }
}

/// [`FetchClient`] backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetchClient {
    client: Client,
}

impl HttpFetchClient {
    /// Creates a fetch client from the user agent configuration
    pub fn new(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, timeout)?,
        })
    }

    /// Wraps an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchClient for HttpFetchClient {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_request_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(url, status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html_content_type(&content_type) {
            return Err(FetchError::Permanent {
                url: url.to_string(),
                reason: format!("Expected HTML, got {}", content_type),
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(url, &e))?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Accepts `text/html`, `application/xhtml+xml` and responses without a Content-Type
fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.is_empty()
        || content_type.contains("text/html")
        || content_type.contains("application/xhtml+xml")
}

/// Maps a non-success HTTP status to a fetch failure
pub fn classify_status(url: &Url, status: StatusCode) -> FetchError {
    let reason = format!("HTTP {}", status.as_u16());
    let url = url.to_string();

    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        FetchError::Transient { url, reason }
    } else {
        FetchError::Permanent { url, reason }
    }
}

fn classify_request_error(url: &Url, error: &reqwest::Error) -> FetchError {
    if let Some(status) = error.status() {
        return classify_status(url, status);
    }

    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Transient {
            url,
            reason: "Request timeout".to_string(),
        }
    } else if error.is_connect() {
        FetchError::Transient {
            url,
            reason: "Connection failed".to_string(),
        }
    } else if error.is_redirect() {
        FetchError::Permanent {
            url,
            reason: format!("Redirect error: {}", error),
        }
    } else {
        FetchError::Transient {
            url,
            reason: error.to_string(),
        }
    }
}
