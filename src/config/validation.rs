use crate::config::types::{Config, CrawlSection, FetchSection, IdentitySection};
use crate::extract::Sanitizer;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_section(&config.fetch)?;
    validate_crawl_section(&config.crawl)?;
    validate_identity_section(&config.identity)?;
    // Compiling the tables is the validation: bad selectors or regexes fail here
    Sanitizer::new(config.pattern_tables())?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_section(config: &FetchSection) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.retry_attempts < 1 || config.retry_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be between 1 and 10, got {}",
            config.retry_attempts
        )));
    }

    if config.max_body_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max-body-bytes must be at least 1024, got {}",
            config.max_body_bytes
        )));
    }

    validate_window(
        "delay range",
        config.delay_min_secs,
        config.delay_max_secs,
    )?;
    validate_window(
        "rate-limit-backoff",
        config.rate_limit_backoff[0],
        config.rate_limit_backoff[1],
    )?;
    validate_window(
        "transient-backoff",
        config.transient_backoff[0],
        config.transient_backoff[1],
    )?;

    if config.render {
        Url::parse(&config.webdriver_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid webdriver-url: {}", e)))?;
    }

    Ok(())
}

/// Longest wait any delay or backoff window may ask for, in seconds
pub const MAX_WINDOW_SECS: f64 = 3600.0;

/// Validates a [min, max] window expressed in seconds
fn validate_window(name: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be finite and non-negative, got [{}, {}]",
            name, min, max
        )));
    }

    if max > MAX_WINDOW_SECS {
        return Err(ConfigError::Validation(format!(
            "{} maximum ({}) exceeds {} seconds",
            name, max, MAX_WINDOW_SECS
        )));
    }

    if min > max {
        return Err(ConfigError::Validation(format!(
            "{} minimum ({}) exceeds maximum ({})",
            name, min, max
        )));
    }

    Ok(())
}

/// Validates crawl budgets
fn validate_crawl_section(config: &CrawlSection) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.links_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "links-per-page must be >= 1, got {}",
            config.links_per_page
        )));
    }

    Ok(())
}

/// Validates the identity pool
fn validate_identity_section(config: &IdentitySection) -> Result<(), ConfigError> {
    if config.accept_language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "accept-language cannot be empty".to_string(),
        ));
    }

    for agent in &config.user_agents {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agents cannot contain empty entries".to_string(),
            ));
        }

        if agent.chars().any(|c| c.is_control()) {
            return Err(ConfigError::Validation(format!(
                "user agent contains control characters: '{}'",
                agent.escape_debug()
            )));
        }
    }

    Ok(())
}
