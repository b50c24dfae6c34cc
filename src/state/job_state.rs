/// Worker state definitions for the fetch/extract/emit cycle
use std::fmt;

/// Represents what a pool worker is currently doing with its job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Waiting on the submission channel
    Idle,

    /// Fetching the area's results page
    Fetching,

    /// Pulling records out of the fetched page
    Extracting,

    /// Sending records onto the result channel
    Emitting,
}

impl JobState {
    /// Returns true if the worker currently owns a job
    pub fn is_busy(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// `Fetching -> Idle` covers a failed fetch, which completes the job
    /// without extracting anything.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Fetching)
                | (Self::Fetching, Self::Extracting)
                | (Self::Fetching, Self::Idle)
                | (Self::Extracting, Self::Emitting)
                | (Self::Emitting, Self::Idle)
        )
    }

    /// Moves to `next`, returning the new state
    ///
    /// Illegal transitions are a programming error and trip a debug assertion.
    pub fn advance(self, next: JobState) -> JobState {
        debug_assert!(
            self.can_transition_to(next),
            "illegal worker transition {} -> {}",
            self,
            next
        );
        next
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Emitting => "emitting",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
