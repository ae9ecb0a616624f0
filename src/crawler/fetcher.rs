//! Fetcher capability and its HTTP implementation
//!
//! The traversal core only knows the [`Fetcher`] trait. Anything that can turn
//! an identifier into content plus an ordered list of linked identifiers can
//! drive a crawl: an HTTP client, a canned in-memory map, or a test double.

use crate::config::UserAgentConfig;
use crate::crawler::parser::parse_html;
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Successful result of fetching one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Content reported for the identifier
    pub content: String,

    /// Linked identifiers, in the order they should be followed
    pub links: Vec<String>,
}

impl FetchedPage {
    pub fn new<C, I, L>(content: C, links: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            content: content.into(),
            links: links.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolves an identifier to its content and outgoing links
///
/// Implementations are called concurrently from many traversal tasks and
/// must not rely on calls being serialised.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, id: &str) -> FetchResult<FetchedPage>;
}

/// Builds an HTTP client with proper configuration
///
/// The user agent follows the `Name/Version (+ContactURL; ContactEmail)`
/// convention so site operators can identify the crawler.
///
/// # Example
///
/// ```no_run
/// use sumi_fanout::config::UserAgentConfig;
/// use sumi_fanout::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiFanout".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
///     timeout_secs: 30,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs((config.timeout_secs / 3).max(1)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by real HTTP requests
///
/// # Request Flow
///
/// 1. Parse the identifier as an http(s) URL
///    - Otherwise → `InvalidId`
/// 2. Send a GET request, following up to 10 redirects
///    - Transport failure or timeout → `Network`
///    - Non-2xx status → `Http`
/// 3. Require an HTML Content-Type
///    - Otherwise → `ContentMismatch`
/// 4. Parse the body: content is the `<title>` when present, the raw body
///    otherwise; links are resolved against the final URL
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a client built from the user agent settings
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, id: &str) -> FetchResult<FetchedPage> {
        let url = Url::parse(id).map_err(|e| FetchError::InvalidId {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FetchError::InvalidId {
                id: id.to_string(),
                reason: format!("unsupported scheme: {}", url.scheme()),
            });
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(id, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.contains("text/html") {
            return Err(FetchError::ContentMismatch {
                id: id.to_string(),
                content_type,
            });
        }

        let body = response.text().await.map_err(|e| network_error(id, &e))?;
        let parsed = parse_html(&body, &final_url);

        Ok(FetchedPage {
            content: parsed.title.unwrap_or(body),
            links: parsed.links,
        })
    }
}

fn network_error(id: &str, e: &reqwest::Error) -> FetchError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        "connection refused".to_string()
    } else {
        e.to_string()
    };

    FetchError::Network {
        id: id.to_string(),
        message,
    }
}
