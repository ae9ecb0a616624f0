//! Sumi-Fanout: a bounded-depth concurrent link crawler
//!
//! This crate walks a link graph from a seed identifier, spawning one task per
//! identifier, guarding every fetch with a shared visited set, and merging the
//! results of every subtree back into a single stream.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for Sumi-Fanout operations
#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
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
}

/// Errors reported by a [`crawler::Fetcher`]
///
/// A fetch error never aborts a crawl. It prunes the subtree below the
/// identifier that failed and is recorded in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid identifier {id}: {reason}")]
    InvalidId { id: String, reason: String },

    #[error("HTTP {status} for {id}")]
    Http { id: String, status: u16 },

    #[error("network error for {id}: {message}")]
    Network { id: String, message: String },

    #[error("content mismatch for {id}: expected HTML, got {content_type}")]
    ContentMismatch { id: String, content_type: String },
}

impl FetchError {
    /// The identifier the failed fetch was for
    pub fn id(&self) -> &str {
        match self {
            Self::NotFound(id) => id,
            Self::InvalidId { id, .. }
            | Self::Http { id, .. }
            | Self::Network { id, .. }
            | Self::ContentMismatch { id, .. } => id,
        }
    }
}

/// Result type alias for Sumi-Fanout operations
pub type Result<T> = std::result::Result<T, FanoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlStream, FetchedPage, Fetcher, HttpFetcher, ResultItem, StaticFetcher};
pub use output::CrawlReport;
pub use state::{TaskState, VisitedSet};
