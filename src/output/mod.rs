//! Output module for rendering harvest results
//!
//! This module handles:
//! - Rendering the aggregated table as comma-separated text
//! - Summarising a run (jobs, failures, records)

mod csv;
pub mod stats;
mod traits;

pub use self::csv::{format_csv, format_csv_row, CsvOutput};
pub use stats::{print_statistics, RunStatistics};
pub use traits::{OutputError, OutputHandler, OutputResult};

use crate::crawler::Harvest;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

/// Writes the harvest as CSV to `path`, or to stdout when `path` is `None`
pub fn write_harvest(harvest: &Harvest, path: Option<&Path>) -> OutputResult<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut output = CsvOutput::new(BufWriter::new(file));
            output.write_harvest(harvest)?;
            output.finalize()
        }
        None => {
            let stdout = io::stdout();
            let mut output = CsvOutput::new(stdout.lock());
            output.write_harvest(harvest)?;
            output.finalize()
        }
    }
}
