//! Bounded worker pool for fetching and extracting results pages
//!
//! The pool owns two channels:
//!
//! - a submission channel of [`Job`]s shared by all workers
//! - a result channel of [`Emission`]s drained by the aggregator
//!
//! Completion is tracked through the result channel's sender count. Every
//! submitted job carries its own clone of the result sender, taken before the
//! job is handed to the submission channel, and releases it when the job is
//! finished. Once [`WorkerPool::await_completion`] has dropped the pool's own
//! sender, the channel closes exactly when the last outstanding job is done.
//! The close is performed by tokio's sender bookkeeping, so concurrent workers
//! finishing at the same moment can neither close it twice nor miss it.

use crate::crawler::extractor::{Record, RecordExtractor};
use crate::crawler::fetcher::{expand_locator, DocumentFetcher};
use crate::crawler::manifest::Area;
use crate::state::JobState;
use crate::HarvestError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Submission channel bound; the smallest tokio allows
const JOB_BUFFER: usize = 1;

/// Result channel bound; an unread result stalls the emitting worker
const RESULT_BUFFER: usize = 1;

/// A record together with its stable sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedRecord {
    /// Submission sequence number of the job that produced the record
    pub job: usize,
    /// Row position within the job's page
    pub row: usize,
    pub record: Record,
}

/// A job whose page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub job: usize,
    pub area: Area,
    pub locator: String,
    pub cause: String,
}

/// A job that fetched and extracted successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub job: usize,
    pub area_id: String,
    pub records: usize,
}

/// Everything a worker sends to the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Record(EmittedRecord),
    Failed(JobFailure),
    Completed(JobSummary),
}

/// Counts a job as pending for as long as it is alive
#[derive(Debug)]
struct PendingTicket(Arc<AtomicUsize>);

impl PendingTicket {
    fn issue(pending: &Arc<AtomicUsize>) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(pending))
    }
}

impl Drop for PendingTicket {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One area submitted for fetch and extraction
#[derive(Debug)]
pub struct Job {
    pub seq: usize,
    pub area: Area,
    emit: mpsc::Sender<Emission>,
    _ticket: PendingTicket,
}

/// Fixed-size pool of fetch workers
pub struct WorkerPool {
    jobs: mpsc::Sender<Job>,
    results: mpsc::Sender<Emission>,
    pending: Arc<AtomicUsize>,
    submitted: usize,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers and returns the pool with its result receiver
    ///
    /// # Arguments
    ///
    /// * `size` - Number of concurrent workers (at least one is spawned)
    /// * `fetcher` - Source of results pages
    /// * `extractor` - Turns each page into records
    /// * `page_template` - Page locator with an `{id}` placeholder
    pub fn new(
        size: usize,
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: RecordExtractor,
        page_template: impl Into<String>,
    ) -> (Self, mpsc::Receiver<Emission>) {
        let (job_tx, job_rx) = mpsc::channel::<Job>(JOB_BUFFER);
        let (result_tx, result_rx) = mpsc::channel::<Emission>(RESULT_BUFFER);

        let job_rx = Arc::new(Mutex::new(job_rx));
        let extractor = Arc::new(extractor);
        let page_template: Arc<str> = Arc::from(page_template.into());

        let workers = (0..size.max(1))
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&job_rx),
                    Arc::clone(&fetcher),
                    Arc::clone(&extractor),
                    Arc::clone(&page_template),
                ))
            })
            .collect::<Vec<_>>();

        tracing::debug!("Worker pool started with {} workers", workers.len());

        let pool = Self {
            jobs: job_tx,
            results: result_tx,
            pending: Arc::new(AtomicUsize::new(0)),
            submitted: 0,
            workers,
        };

        (pool, result_rx)
    }

    /// Hands one area to the pool
    ///
    /// The job is counted as pending before the send is attempted and the
    /// send waits while every worker is busy.
    pub async fn submit(&mut self, area: Area) -> Result<(), HarvestError> {
        let job = Job {
            seq: self.submitted,
            area,
            emit: self.results.clone(),
            _ticket: PendingTicket::issue(&self.pending),
        };

        self.jobs
            .send(job)
            .await
            .map_err(|_| HarvestError::Worker("worker pool is closed".to_string()))?;

        self.submitted += 1;
        Ok(())
    }

    /// Number of submitted jobs that have not finished yet
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Number of jobs accepted so far
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Waits until every submitted job has finished, closing the result channel
    ///
    /// The result receiver must be drained concurrently, otherwise workers
    /// block on emission and this never returns.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of jobs that were submitted
    /// * `Err(HarvestError)` - A worker task panicked
    pub async fn await_completion(self) -> Result<usize, HarvestError> {
        let WorkerPool {
            jobs,
            results,
            pending,
            submitted,
            workers,
        } = self;

        drop(results);
        drop(jobs);

        let mut panicked = 0;
        for handle in workers {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
                panicked += 1;
            }
        }

        let remaining = pending.load(Ordering::SeqCst);
        debug_assert_eq!(remaining, 0, "jobs still pending after workers exited");

        if panicked > 0 {
            return Err(HarvestError::Worker(format!(
                "{} worker task(s) panicked",
                panicked
            )));
        }

        tracing::debug!("All {} jobs completed", submitted);
        Ok(submitted)
    }
}

async fn run_worker(
    worker: usize,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<RecordExtractor>,
    page_template: Arc<str>,
) {
    let mut state = JobState::Idle;

    loop {
        let job = {
            let mut receiver = jobs.lock().await;
            receiver.recv().await
        };

        let Some(job) = job else {
            break;
        };

        state = process_job(worker, state, job, fetcher.as_ref(), &extractor, &page_template).await;
    }

    tracing::trace!("Worker {} exiting", worker);
}

/// Runs one job through fetch, extract and emit
///
/// The job, with its result sender and pending ticket, is dropped on return.
async fn process_job(
    worker: usize,
    state: JobState,
    job: Job,
    fetcher: &dyn DocumentFetcher,
    extractor: &RecordExtractor,
    page_template: &str,
) -> JobState {
    let locator = expand_locator(page_template, &job.area.id);

    let state = state.advance(JobState::Fetching);
    tracing::trace!("Worker {} {} job {} ({})", worker, state, job.seq, locator);

    let page = match fetcher.fetch_page(&locator).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Failed to fetch {} for {}: {}", locator, job.area.name, e);
            let failure = JobFailure {
                job: job.seq,
                area: job.area.clone(),
                locator,
                cause: e.to_string(),
            };
            if job.emit.send(Emission::Failed(failure)).await.is_err() {
                tracing::debug!("Result receiver dropped; discarding failure of job {}", job.seq);
            }
            return state.advance(JobState::Idle);
        }
    };

    let state = state.advance(JobState::Extracting);
    let records = extractor.extract(&page, &job.area);
    tracing::trace!(
        "Worker {} extracted {} records from {}",
        worker,
        records.len(),
        locator
    );

    let state = state.advance(JobState::Emitting);
    let count = records.len();
    for (row, record) in records.into_iter().enumerate() {
        let emitted = EmittedRecord {
            job: job.seq,
            row,
            record,
        };
        if job.emit.send(Emission::Record(emitted)).await.is_err() {
            tracing::debug!("Result receiver dropped; abandoning job {}", job.seq);
            return state.advance(JobState::Idle);
        }
    }

    let summary = JobSummary {
        job: job.seq,
        area_id: job.area.id.clone(),
        records: count,
    };
    if job.emit.send(Emission::Completed(summary)).await.is_err() {
        tracing::debug!("Result receiver dropped; completion of job {} not reported", job.seq);
    }

    state.advance(JobState::Idle)
}
