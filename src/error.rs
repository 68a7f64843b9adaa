//! Error types used by the queue, the controller, and tasks.
//!
//! A single enum, [`TaskError`], covers everything a task settlement can carry:
//!
//! - [`TaskError::Failed`] the task body returned an error or panicked.
//! - [`TaskError::Canceled`] the task was cancelled before or during execution.
//!
//! Cancellation is a distinct terminal state, not a failure: instance handles
//! never report it through `is_error`, and [`TaskInstance::done`](crate::TaskInstance::done)
//! resolves it as a quiet `Ok(None)`. Helper methods (`as_label`, `as_message`,
//! `is_cancellation`) are provided for logs and metrics.

use thiserror::Error;

/// # Errors produced by task execution.
///
/// Panics inside a task body (or inside the start-thunk itself) are captured
/// and folded into [`TaskError::Failed`], so a synchronous panic is
/// indistinguishable from an asynchronous failure to every observer.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Task was cancelled before completion (possibly before it ever started).
    #[error("task cancelled")]
    Canceled,
}

impl TaskError {
    /// Creates a [`TaskError::Failed`] from any displayable message.
    pub fn failed(error: impl Into<String>) -> Self {
        TaskError::Failed { error: error.into() }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskgate::TaskError;
    ///
    /// assert_eq!(TaskError::failed("boom").as_label(), "task_failed");
    /// assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Failed { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Failed { error } => format!("error: {error}"),
            TaskError::Canceled => "cancelled".to_string(),
        }
    }

    /// True when this settlement represents a cancellation rather than a
    /// genuine failure.
    ///
    /// Downstream error-channel consumers must check this before treating a
    /// settlement as a crash.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }
}
