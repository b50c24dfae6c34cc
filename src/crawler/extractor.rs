//! Record extraction from results pages
//!
//! Each row of the results table becomes one [`Record`]. Cells are read by
//! fixed position:
//!
//! | cell | field |
//! |------|-------|
//! | 1 | number |
//! | 2 | candidates (inner markup, line breaks become `/`) |
//! | 4 | ballots (thousands separators removed) |
//! | 5 | percentage |
//!
//! A page without the table yields no records. Short rows yield empty fields.

use crate::config::TableConfig;
use crate::crawler::fetcher::Page;
use crate::crawler::manifest::Area;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;

/// Separator that replaces line breaks between candidate names
pub const CANDIDATE_SEPARATOR: &str = "/";

const NUMBER_CELL: usize = 1;
const CANDIDATES_CELL: usize = 2;
const BALLOTS_CELL: usize = 4;
const PERCENTAGE_CELL: usize = 5;

/// One extracted table row, tagged with the area it came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub division: String,
    pub district: String,
    pub number: String,
    pub candidates: String,
    pub ballots: String,
    pub percentage: String,
}

impl Record {
    /// Builds the pseudo-record used as the header row
    ///
    /// Labels beyond the sixth are ignored; missing labels are left empty.
    pub fn header<S: AsRef<str>>(labels: &[S]) -> Self {
        let label = |i: usize| {
            labels
                .get(i)
                .map(|s| s.as_ref().to_string())
                .unwrap_or_default()
        };
        Self {
            division: label(0),
            district: label(1),
            number: label(2),
            candidates: label(3),
            ballots: label(4),
            percentage: label(5),
        }
    }

    /// Fields in output column order
    pub fn fields(&self) -> [&str; 6] {
        [
            self.division.as_str(),
            self.district.as_str(),
            self.number.as_str(),
            self.candidates.as_str(),
            self.ballots.as_str(),
            self.percentage.as_str(),
        ]
    }
}

/// Compiled selectors locating the results table
#[derive(Debug, Clone)]
pub struct TableLayout {
    rows: Selector,
    cells: Selector,
}

impl TableLayout {
    /// Compiles a layout from row and cell CSS selectors
    pub fn new(row_selector: &str, cell_selector: &str) -> Result<Self, String> {
        let compile = |s: &str| Selector::parse(s).map_err(|e| format!("{}: {}", s, e));
        Ok(Self {
            rows: compile(row_selector)?,
            cells: compile(cell_selector)?,
        })
    }

    pub fn from_config(config: &TableConfig) -> Result<Self, String> {
        Self::new(&config.row_selector, &config.cell_selector)
    }
}

impl Default for TableLayout {
    fn default() -> Self {
        Self::from_config(&TableConfig::default()).expect("default table selectors are valid")
    }
}

/// Turns results pages into records
#[derive(Debug, Clone, Default)]
pub struct RecordExtractor {
    layout: TableLayout,
}

impl RecordExtractor {
    pub fn new(layout: TableLayout) -> Self {
        Self { layout }
    }

    /// Extracts one record per table row of `page`
    ///
    /// Pure: the same page and area always produce the same records.
    pub fn extract(&self, page: &Page, area: &Area) -> Vec<Record> {
        let document = page.document();

        document
            .select(&self.layout.rows)
            .map(|row| {
                let cells: Vec<ElementRef<'_>> = row.select(&self.layout.cells).collect();
                let text = |i: usize| cells.get(i).map(cell_text).unwrap_or_default();
                let markup = |i: usize| cells.get(i).map(|c| c.inner_html()).unwrap_or_default();

                Record {
                    division: area.division.clone(),
                    district: area.name.clone(),
                    number: text(NUMBER_CELL),
                    candidates: join_line_breaks(&markup(CANDIDATES_CELL)),
                    ballots: strip_grouping(&text(BALLOTS_CELL)),
                    percentage: text(PERCENTAGE_CELL),
                }
            })
            .collect()
    }
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect()
}

fn line_break_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("line break regex is valid"))
}

/// Rewrites every `<br>` variant in `markup` to the candidate separator
pub fn join_line_breaks(markup: &str) -> String {
    line_break_pattern()
        .replace_all(markup, CANDIDATE_SEPARATOR)
        .into_owned()
}

/// Removes thousands separators from a numeric cell
pub fn strip_grouping(text: &str) -> String {
    text.replace(',', "")
}
