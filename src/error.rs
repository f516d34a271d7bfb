//! Error taxonomy for the reminder core.

use thiserror::Error;

/// Errors surfaced by the reminder core.
///
/// None of these are fatal to the process: validation errors abort the
/// single operation that produced them, persistence errors leave the
/// in-memory collection authoritative for the session, and evaluation
/// errors are logged by the sweep driver which always moves on.
#[derive(Debug, Error)]
pub enum DaybellError {
    /// Bad user input (title, time string, weekday set). The operation
    /// aborts with no state change.
    #[error("invalid schedule: {0}")]
    Validation(String),

    /// An operation referenced a schedule slot that does not exist.
    #[error("no schedule at index {index} (collection has {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Writing the schedule file failed.
    #[error("failed to persist schedules: {0}")]
    Persistence(String),

    /// Checking or firing one schedule failed; the sweep continues with
    /// the remaining schedules.
    #[error("evaluation failed for '{title}': {reason}")]
    Evaluation { title: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DaybellError>;
