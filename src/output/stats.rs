//! Run statistics
//!
//! Summarises a finished harvest for the operator. Printed to stderr so the
//! CSV on stdout stays clean.

use crate::crawler::{Harvest, JobFailure};
use std::time::Duration;

/// Harvest statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    /// Number of leaf areas submitted as jobs
    pub areas: usize,

    pub jobs_succeeded: usize,
    pub jobs_failed: usize,

    /// Data rows collected, header excluded
    pub records: usize,

    pub elapsed: Duration,

    /// Failed jobs as (area name, cause)
    pub failures: Vec<(String, String)>,
}

impl RunStatistics {
    /// Builds statistics from a finished harvest
    pub fn from_harvest(harvest: &Harvest, elapsed: Duration) -> Self {
        Self {
            areas: harvest.jobs_finished(),
            jobs_succeeded: harvest.jobs_succeeded(),
            jobs_failed: harvest.jobs_failed(),
            records: harvest.record_count(),
            elapsed,
            failures: harvest.failures().iter().map(describe_failure).collect(),
        }
    }

    /// Returns the share of jobs that fetched successfully as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.areas == 0 {
            return 0.0;
        }
        (self.jobs_succeeded as f64 / self.areas as f64) * 100.0
    }
}

fn describe_failure(failure: &JobFailure) -> (String, String) {
    let name = if failure.area.division.is_empty() {
        failure.area.name.clone()
    } else {
        format!("{} {}", failure.area.division, failure.area.name)
    };
    (name, failure.cause.clone())
}

/// Prints statistics to stderr in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    eprintln!("=== Harvest Statistics ===\n");

    eprintln!("Overview:");
    eprintln!("  Areas: {}", stats.areas);
    eprintln!("  Succeeded: {}", stats.jobs_succeeded);
    eprintln!("  Failed: {}", stats.jobs_failed);
    eprintln!("  Records: {}", stats.records);
    eprintln!("  Elapsed: {:.2}s", stats.elapsed.as_secs_f64());
    eprintln!();

    if !stats.failures.is_empty() {
        eprintln!("Failed Areas ({}):", stats.failures.len());
        for (name, cause) in &stats.failures {
            eprintln!("  - {}: {}", name, cause);
        }
        eprintln!();
    }

    eprintln!(
        "Success Rate: {:.1}% ({} / {} areas fetched)",
        stats.success_rate(),
        stats.jobs_succeeded,
        stats.areas
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let stats = RunStatistics {
            areas: 10,
            jobs_succeeded: 8,
            jobs_failed: 2,
            ..RunStatistics::default()
        };
        assert!((stats.success_rate() - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_areas() {
        assert_eq!(RunStatistics::default().success_rate(), 0.0);
    }

    #[test]
    fn test_from_empty_harvest() {
        let harvest = Harvest::new(crate::crawler::Record::default());
        let stats = RunStatistics::from_harvest(&harvest, Duration::from_secs(1));
        assert_eq!(stats.areas, 0);
        assert_eq!(stats.records, 0);
        assert!(stats.failures.is_empty());
    }
}
