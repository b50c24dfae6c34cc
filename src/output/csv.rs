//! Comma-separated rendering of harvest rows
//!
//! Fields are quoted only when needed: when they contain the delimiter, a
//! quote, a line break, or start with whitespace. Embedded quotes are doubled.
//! Rows end with `\n`.

use crate::crawler::Harvest;
use crate::output::traits::{OutputHandler, OutputResult};
use std::io::Write;

const DELIMITER: char = ',';

/// Renders harvests as CSV into any writer
pub struct CsvOutput<W: Write> {
    writer: W,
    rows_written: usize,
}

impl<W: Write> CsvOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            rows_written: 0,
        }
    }

    /// Number of rows written so far, header included
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputHandler for CsvOutput<W> {
    fn write_harvest(&mut self, harvest: &Harvest) -> OutputResult<()> {
        for row in harvest.rows() {
            writeln!(self.writer, "{}", format_csv_row(&row.fields()))?;
            self.rows_written += 1;
        }
        Ok(())
    }

    fn finalize(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Formats a whole harvest as CSV text
pub fn format_csv(harvest: &Harvest) -> String {
    let mut out = String::new();
    for row in harvest.rows() {
        out.push_str(&format_csv_row(&row.fields()));
        out.push('\n');
    }
    out
}

/// Formats one row without the trailing newline
pub fn format_csv_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| quote_field(field))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}

fn needs_quotes(field: &str) -> bool {
    if field.is_empty() {
        return false;
    }
    field.contains(&[DELIMITER, '"', '\r', '\n'][..])
        || field.chars().next().is_some_and(char::is_whitespace)
}

fn quote_field(field: &str) -> String {
    if needs_quotes(field) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
