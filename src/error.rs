use std::any::Any;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BatchError>;

/// Errors that fail a whole batch. Task failures never end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("invalid concurrency limit {limit}: must be at least 1")]
    InvalidLimit { limit: usize },
    #[error("batch finished with {missing} unrecorded outcome(s)")]
    Incomplete { missing: usize },
}

/// Failure payload for tasks that run on the tokio runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError<E> {
    #[error("task failed: {0}")]
    Failed(E),
    #[error("task panicked: {0}")]
    Panicked(String),
    #[error("task aborted: {0}")]
    Aborted(String),
}

impl<E> TaskError<E> {
    /// Build from a caught panic payload, keeping the message when it is a string.
    pub fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let msg = payload
            .downcast_ref::<&'static str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        TaskError::Panicked(msg)
    }
}

/* Conversions so `?` works smoothly */
impl<E> From<tokio::task::JoinError> for TaskError<E> {
    fn from(e: tokio::task::JoinError) -> Self {
        if e.is_panic() {
            TaskError::panicked(e.into_panic())
        } else {
            TaskError::Aborted(e.to_string())
        }
    }
}

/// Error of the legacy all-or-nothing contract ([`crate::tools::batch::try_bounded_map`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegacyError<E> {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("item {index} failed: {error}")]
    Task { index: usize, error: E },
}
