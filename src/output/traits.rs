//! Output handler traits and error types
//!
//! An output handler receives the finished harvest once, after the result
//! channel has closed, and renders it somewhere.

use crate::crawler::Harvest;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for output handlers
///
/// Write failures are fatal to the run; handlers must not swallow them.
pub trait OutputHandler {
    /// Renders every row of the harvest, header first
    fn write_harvest(&mut self, harvest: &Harvest) -> OutputResult<()>;

    /// Flushes any buffered output
    fn finalize(&mut self) -> OutputResult<()>;
}
