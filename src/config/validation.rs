use crate::config::types::{Config, CrawlerConfig, FetcherKind, PageEntry, UserAgentConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Largest accepted `max-depth`
///
/// Fan-out is unbounded per level, so deep crawls of wide graphs spawn an
/// enormous number of tasks. This caps the obviously wrong values.
pub const MAX_DEPTH_LIMIT: u32 = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;

    match config.fetcher.kind {
        FetcherKind::Static => validate_pages(&config.pages)?,
        FetcherKind::Http => {
            validate_http_seed(&config.crawler.seed)?;
            let user_agent = config.user_agent.as_ref().ok_or_else(|| {
                ConfigError::Validation(
                    "[user-agent] section is required when fetcher kind is \"http\"".to_string(),
                )
            })?;
            validate_user_agent_config(user_agent)?;
        }
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.seed.trim().is_empty() {
        return Err(ConfigError::Validation("seed cannot be empty".to_string()));
    }

    validate_max_depth(config.max_depth)
}

/// Rejects depths above [`MAX_DEPTH_LIMIT`]
pub fn validate_max_depth(max_depth: u32) -> Result<(), ConfigError> {
    if max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-depth must be <= {}, got {}",
            MAX_DEPTH_LIMIT, max_depth
        )));
    }

    Ok(())
}

fn validate_http_seed(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use http or https",
            seed
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Basic shape check: one `@`, non-empty local part, dotted domain
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "Invalid contact-email: '{}'",
            email
        )))
    }
}

fn validate_pages(pages: &[PageEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for page in pages {
        if page.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "page id cannot be empty".to_string(),
            ));
        }

        if !seen.insert(page.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate page id '{}'",
                page.id
            )));
        }
    }

    Ok(())
}
