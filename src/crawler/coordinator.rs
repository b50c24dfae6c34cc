//! Harvest coordinator - main orchestration logic
//!
//! This module ties the pipeline together:
//! - Resolving the manifest (fatal on failure, before any worker starts)
//! - Submitting every leaf area to the worker pool from a separate task
//! - Aggregating emissions on the calling task until the pool closes
//! - Optionally sorting the result into submission order

use crate::config::Config;
use crate::crawler::aggregator::{aggregate, Harvest};
use crate::crawler::extractor::{Record, RecordExtractor, TableLayout};
use crate::crawler::fetcher::{DocumentFetcher, HttpFetcher};
use crate::crawler::manifest::{resolve_manifest, ManifestIndex};
use crate::crawler::pool::WorkerPool;
use crate::{ConfigError, HarvestError};
use std::sync::Arc;
use std::time::Instant;

/// Main harvest coordinator
pub struct Harvester {
    config: Config,
    fetcher: Arc<dyn DocumentFetcher>,
}

impl Harvester {
    /// Creates a harvester over any document source
    pub fn new(config: Config, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Creates a harvester that fetches over HTTP
    pub fn from_config(config: Config) -> Result<Self, HarvestError> {
        let fetcher = HttpFetcher::from_config(&config.http)?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches and parses the manifest
    pub async fn resolve(&self) -> Result<ManifestIndex, HarvestError> {
        resolve_manifest(self.fetcher.as_ref(), &self.config.source.manifest_url).await
    }

    /// Resolves the manifest and harvests every leaf area
    ///
    /// # Returns
    ///
    /// * `Ok(Harvest)` - All jobs finished; per-job failures are inside the harvest
    /// * `Err(HarvestError)` - The manifest could not be resolved or a worker panicked
    pub async fn run(&self) -> Result<Harvest, HarvestError> {
        let index = self.resolve().await?;
        self.harvest(index).await
    }

    /// Harvests every leaf area of an already resolved index
    pub async fn harvest(&self, index: ManifestIndex) -> Result<Harvest, HarvestError> {
        let start_time = Instant::now();
        let layout = TableLayout::from_config(&self.config.table).map_err(ConfigError::Validation)?;

        let (mut pool, results) = WorkerPool::new(
            self.config.pool.workers,
            Arc::clone(&self.fetcher),
            RecordExtractor::new(layout),
            self.config.source.page_url_template.clone(),
        );

        let areas = index.into_leaves();
        tracing::info!(
            "Harvesting {} areas with {} workers",
            areas.len(),
            self.config.pool.workers
        );

        let submitter = tokio::spawn(async move {
            for area in areas {
                pool.submit(area).await?;
            }
            pool.await_completion().await
        });

        let mut harvest = aggregate(results, Record::header(&self.config.output.header)).await;

        let submitted = submitter
            .await
            .map_err(|e| HarvestError::Worker(e.to_string()))??;

        if self.config.output.ordered {
            harvest.sort_by_submission();
        }

        if harvest.jobs_failed() > 0 {
            tracing::warn!(
                "{} of {} areas could not be fetched",
                harvest.jobs_failed(),
                submitted
            );
        }

        tracing::info!(
            "Harvest completed: {} records from {} areas in {:?}",
            harvest.record_count(),
            submitted,
            start_time.elapsed()
        );

        Ok(harvest)
    }
}

/// Runs a complete harvest over HTTP
///
/// # Example
///
/// ```no_run
/// use tally_harvest::config::Config;
/// use tally_harvest::crawler::run_harvest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let harvest = run_harvest(Config::default()).await?;
/// println!("{} records", harvest.record_count());
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config) -> Result<Harvest, HarvestError> {
    Harvester::from_config(config)?.run().await
}
