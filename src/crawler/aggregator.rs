//! Fan-in of worker emissions into a single table

use crate::crawler::extractor::Record;
use crate::crawler::pool::{Emission, JobFailure};
use tokio::sync::mpsc;

/// The collected output of one harvest
///
/// `rows[0]` is always the header pseudo-record; data rows follow in the
/// order they arrived from the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harvest {
    rows: Vec<Record>,
    /// (job, row) sort key of each data row, parallel to `rows[1..]`
    keys: Vec<(usize, usize)>,
    jobs_succeeded: usize,
    failures: Vec<JobFailure>,
}

impl Harvest {
    /// Starts an empty harvest seeded with the header row
    pub fn new(header: Record) -> Self {
        Self {
            rows: vec![header],
            keys: Vec::new(),
            jobs_succeeded: 0,
            failures: Vec::new(),
        }
    }

    /// Every row, header first
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn header(&self) -> &Record {
        &self.rows[0]
    }

    /// Data rows only
    pub fn records(&self) -> &[Record] {
        &self.rows[1..]
    }

    pub fn record_count(&self) -> usize {
        self.rows.len() - 1
    }

    pub fn jobs_succeeded(&self) -> usize {
        self.jobs_succeeded
    }

    pub fn jobs_failed(&self) -> usize {
        self.failures.len()
    }

    /// Jobs that reached a terminal state, successful or not
    pub fn jobs_finished(&self) -> usize {
        self.jobs_succeeded + self.failures.len()
    }

    pub fn failures(&self) -> &[JobFailure] {
        &self.failures
    }

    /// Sorts data rows by submission order, then by row position
    ///
    /// The header stays first. Failures are sorted by job as well.
    pub fn sort_by_submission(&mut self) {
        let data = self.rows.split_off(1);
        let mut keyed: Vec<((usize, usize), Record)> =
            std::mem::take(&mut self.keys).into_iter().zip(data).collect();
        keyed.sort_by_key(|(key, _)| *key);

        for (key, record) in keyed {
            self.keys.push(key);
            self.rows.push(record);
        }
        self.failures.sort_by_key(|f| f.job);
    }

    /// Appends records that did not arrive through the pool
    ///
    /// They sort after every pooled record.
    pub fn extend_records(&mut self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            self.keys.push((usize::MAX, self.keys.len()));
            self.rows.push(record);
        }
    }

    fn absorb(&mut self, emission: Emission) {
        match emission {
            Emission::Record(emitted) => {
                self.keys.push((emitted.job, emitted.row));
                self.rows.push(emitted.record);
            }
            Emission::Failed(failure) => self.failures.push(failure),
            Emission::Completed(_) => self.jobs_succeeded += 1,
        }
    }
}

/// Drains `results` until the pool closes it
///
/// Returns only once the channel is closed and empty, which the pool
/// guarantees happens after every submitted job has finished.
pub async fn aggregate(mut results: mpsc::Receiver<Emission>, header: Record) -> Harvest {
    let mut harvest = Harvest::new(header);

    while let Some(emission) = results.recv().await {
        harvest.absorb(emission);
    }

    tracing::debug!(
        "Aggregated {} records from {} jobs ({} failed)",
        harvest.record_count(),
        harvest.jobs_finished(),
        harvest.jobs_failed()
    );

    harvest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::manifest::Area;
    use crate::crawler::pool::{EmittedRecord, JobSummary};

    fn record(number: &str) -> Record {
        Record {
            number: number.to_string(),
            ..Record::default()
        }
    }

    fn emitted(job: usize, row: usize) -> Emission {
        Emission::Record(EmittedRecord {
            job,
            row,
            record: record(&format!("{}-{}", job, row)),
        })
    }

    fn completed(job: usize, records: usize) -> Emission {
        Emission::Completed(JobSummary {
            job,
            area_id: job.to_string(),
            records,
        })
    }

    fn failed(job: usize) -> Emission {
        Emission::Failed(JobFailure {
            job,
            area: Area::default(),
            locator: format!("mem://{}", job),
            cause: "HTTP 500".to_string(),
        })
    }

    async fn run(emissions: Vec<Emission>) -> Harvest {
        let (tx, rx) = mpsc::channel(emissions.len().max(1));
        for emission in emissions {
            tx.send(emission).await.unwrap();
        }
        drop(tx);
        aggregate(rx, record("header")).await
    }

    #[tokio::test]
    async fn test_header_first_then_arrival_order() {
        let harvest = run(vec![
            emitted(1, 0),
            emitted(0, 0),
            completed(0, 1),
            emitted(1, 1),
            completed(1, 2),
        ])
        .await;

        assert_eq!(harvest.header().number, "header");
        let numbers: Vec<&str> = harvest.records().iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, vec!["1-0", "0-0", "1-1"]);
        assert_eq!(harvest.rows().len(), 4);
        assert_eq!(harvest.jobs_succeeded(), 2);
    }

    #[tokio::test]
    async fn test_output_size_is_header_plus_successful_records() {
        let harvest = run(vec![
            failed(2),
            emitted(0, 0),
            emitted(0, 1),
            completed(0, 2),
            completed(1, 0),
            failed(3),
            emitted(4, 0),
            completed(4, 1),
        ])
        .await;

        assert_eq!(harvest.rows().len(), 1 + 3);
        assert_eq!(harvest.jobs_failed(), 2);
        assert_eq!(harvest.jobs_succeeded(), 3);
        assert_eq!(harvest.jobs_finished(), 5);
    }

    #[tokio::test]
    async fn test_no_deduplication() {
        let harvest = run(vec![emitted(0, 0), emitted(0, 0), completed(0, 2)]).await;
        assert_eq!(harvest.record_count(), 2);
    }

    #[tokio::test]
    async fn test_closed_empty_channel() {
        let harvest = run(Vec::new()).await;
        assert_eq!(harvest.rows().len(), 1);
        assert_eq!(harvest.record_count(), 0);
    }

    #[tokio::test]
    async fn test_sort_by_submission_keeps_header() {
        let mut harvest = run(vec![
            emitted(2, 1),
            emitted(0, 0),
            emitted(2, 0),
            failed(3),
            failed(1),
            emitted(0, 1),
        ])
        .await;
        harvest.sort_by_submission();

        assert_eq!(harvest.header().number, "header");
        let numbers: Vec<&str> = harvest.records().iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, vec!["0-0", "0-1", "2-0", "2-1"]);
        let failed_jobs: Vec<usize> = harvest.failures().iter().map(|f| f.job).collect();
        assert_eq!(failed_jobs, vec![1, 3]);
    }
}
