use crate::config::types::{
    Config, HttpConfig, OutputConfig, PoolConfig, SourceConfig, TableConfig, ID_PLACEHOLDER,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Upper bound on the worker pool size
const MAX_WORKERS: usize = 256;

/// Number of columns every rendered row carries
const COLUMN_COUNT: usize = 6;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_pool_config(&config.pool)?;
    validate_http_config(&config.http)?;
    validate_table_config(&config.table)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates manifest and page locations
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("manifest-url", &config.manifest_url)?;

    let placeholders = config.page_url_template.matches(ID_PLACEHOLDER).count();
    if placeholders != 1 {
        return Err(ConfigError::Validation(format!(
            "page-url-template must contain exactly one {} placeholder, found {}",
            ID_PLACEHOLDER, placeholders
        )));
    }

    // The template itself is not a URL until the placeholder is filled in
    let sample = config.page_url_template.replace(ID_PLACEHOLDER, "0");
    validate_http_url("page-url-template", &sample)?;

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

/// Validates worker pool sizing
fn validate_pool_config(config: &PoolConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }
    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates that the table selectors are well-formed CSS
fn validate_table_config(config: &TableConfig) -> Result<(), ConfigError> {
    for (field, selector) in [
        ("row-selector", &config.row_selector),
        ("cell-selector", &config.cell_selector),
    ] {
        Selector::parse(selector).map_err(|e| {
            ConfigError::Validation(format!("Invalid {} '{}': {}", field, selector, e))
        })?;
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.header.len() != COLUMN_COUNT {
        return Err(ConfigError::Validation(format!(
            "header must have exactly {} labels, got {}",
            COLUMN_COUNT,
            config.header.len()
        )));
    }

    if let Some(path) = &config.path {
        if path.is_empty() {
            return Err(ConfigError::Validation(
                "output path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
