//! Tally-Harvest: a concurrent election tally scraper
//!
//! This crate resolves an area manifest into a two-level index, fans every
//! leaf area out to a bounded worker pool that fetches and parses its results
//! page, and aggregates the extracted rows into a single table.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for Tally-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),
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

/// Structural errors in the area manifest
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("Group {group} has members but no header entry [{group}][0]")]
    MissingGroupHeader { group: usize },

    #[error("Name assigned to [{group}][{member}] which has no identifier")]
    UnknownArea { group: usize, member: usize },

    #[error("Invalid index '{0}' in manifest")]
    InvalidIndex(String),
}

/// Result type alias for Tally-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Area, Harvest, ManifestIndex, Record};
pub use state::JobState;
