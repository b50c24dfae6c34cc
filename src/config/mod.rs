//! Configuration module for Tally-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so an empty file (or no file at all) is a valid
//! configuration pointing at the presidential tally tree.
//!
//! # Example
//!
//! ```no_run
//! use tally_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Workers: {}", config.pool.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, HttpConfig, OutputConfig, PoolConfig, SourceConfig, TableConfig,
    DEFAULT_MANIFEST_URL, DEFAULT_PAGE_URL_TEMPLATE, DEFAULT_WORKERS, ID_PLACEHOLDER,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
