use serde::Deserialize;

/// Main configuration structure for Sumi-Fanout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<UserAgentConfig>,
    #[serde(rename = "page", default)]
    pub pages: Vec<PageEntry>,
}

/// Crawl run configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Identifier the crawl starts from
    pub seed: String,

    /// Maximum number of levels to traverse; 0 fetches nothing
    #[serde(rename = "max-depth")]
    pub max_depth: u32,
}

/// Which fetcher backs the crawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetcherConfig {
    #[serde(default)]
    pub kind: FetcherKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Serve the `[[page]]` tables from memory
    #[default]
    Static,

    /// Fetch over HTTP and extract links from HTML
    Http,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl UserAgentConfig {
    /// Formats the header value: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Canned page served by the static fetcher
#[derive(Debug, Clone, Deserialize)]
pub struct PageEntry {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub links: Vec<String>,
}
