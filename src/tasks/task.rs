//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable, typed). The
//! common handle type is [`TaskRef`], an `Arc<dyn Task>` suitable for sharing
//! between a controller and the queue drivers it spawns.
//!
//! A task receives its arguments and a [`CancellationToken`] and should
//! periodically check the token to stop cooperatively when preempted or
//! cancelled. Cleanup belongs in `Drop` glue (guards held across awaits),
//! which runs exactly once whether the body completes or is cancelled
//! mid-flight.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Boxed future produced by starting a task.
pub type BoxTaskFuture<T> = Pin<Box<dyn Future<Output = Result<T, TaskError>> + Send>>;

/// # Asynchronous, cancelable unit of work.
///
/// A `Task` has a stable [`name`](Task::name) (used as the label on lifecycle
/// events) and an async [`run`](Task::run) method that receives per-perform
/// arguments and a [`CancellationToken`]. Cancellation is cooperative: it
/// takes effect at the next suspension point, and implementations may check
/// the token to exit earlier.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use taskgate::{Task, TaskError};
///
/// struct Double;
///
/// #[async_trait]
/// impl Task<u32, u32> for Double {
///     fn name(&self) -> &str { "double" }
///
///     async fn run(&self, n: u32, ctx: CancellationToken) -> Result<u32, TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         Ok(n * 2)
///     }
/// }
/// ```
#[async_trait]
pub trait Task<A, T>: Send + Sync + 'static
where
    A: Send + 'static,
    T: Send + 'static,
{
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task until completion or cancellation.
    ///
    /// Returning `Err(TaskError::Canceled)` settles the instance as
    /// Cancelled rather than Failed.
    async fn run(&self, args: A, ctx: CancellationToken) -> Result<T, TaskError>;
}

/// Shared handle to a task (`Arc<dyn Task>`).
pub type TaskRef<A, T> = Arc<dyn Task<A, T>>;
