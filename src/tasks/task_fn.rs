//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(A, CancellationToken) -> Fut`, producing
//! a fresh future per perform. This avoids shared mutable state between runs;
//! if shared state is needed, move an `Arc<...>` into the closure explicitly.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskgate::{Task, TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef<u32, u32> = TaskFn::arc("double", |n: u32, _ctx: CancellationToken| async move {
//!     Ok::<_, TaskError>(n * 2)
//! });
//!
//! assert_eq!(t.name(), "double");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::Task;

/// Function-backed task implementation.
///
/// Wraps a closure that *creates* a new future per perform.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the task and returns it as a shared handle (`Arc<TaskFn<F>>`).
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut, A, T> Task<A, T> for TaskFn<F>
where
    F: Fn(A, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    A: Send + 'static,
    T: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, args: A, ctx: CancellationToken) -> Result<T, TaskError> {
        (self.f)(args, ctx).await
    }
}
