//! Harvest pipeline
//!
//! This module contains the discovery, fetch, extract and aggregate stages:
//! - HTTP fetching behind the `DocumentFetcher` trait
//! - Manifest resolution into a two-level area index
//! - Record extraction from results tables
//! - A bounded worker pool with fan-in of results
//! - Overall harvest coordination

mod aggregator;
mod coordinator;
mod extractor;
mod fetcher;
mod manifest;
mod pool;

pub use aggregator::{aggregate, Harvest};
pub use coordinator::{run_harvest, Harvester};
pub use extractor::{
    join_line_breaks, strip_grouping, Record, RecordExtractor, TableLayout, CANDIDATE_SEPARATOR,
};
pub use fetcher::{build_http_client, expand_locator, DocumentFetcher, HttpFetcher, Page};
pub use manifest::{parse_manifest, resolve_manifest, Area, ManifestIndex};
pub use pool::{EmittedRecord, Emission, Job, JobFailure, JobSummary, WorkerPool};
