//! Configuration module for Sumi-Fanout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_fanout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, FetcherConfig, FetcherKind, PageEntry, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, parse_config, read_config_with_hash};
pub use validation::{validate, validate_max_depth, MAX_DEPTH_LIMIT};
