//! Scheduler error types.

use thiserror::Error;

/// Errors that can occur during scheduling operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler has been shut down")]
    ShutDown,
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
