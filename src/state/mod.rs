//! State module for tracking worker progress
//!
//! Every pool worker loops through `Idle -> Fetching -> Extracting -> Emitting -> Idle`
//! until the submission channel is closed and drained. A failed fetch returns the
//! worker straight to `Idle`.

mod job_state;

pub use job_state::JobState;
