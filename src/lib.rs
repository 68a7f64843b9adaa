//! # taskgate
//!
//! **Taskgate** is a small library for bounded, cancellable execution of
//! asynchronous tasks under admission-control policies.
//!
//! It provides a concurrency-limited FIFO queue, a controller that applies
//! one of four admission modes on top of it, and per-perform instance handles
//! with race-free settlement between "the task finished" and "the task was
//! cancelled".
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     caller ──► TaskController::perform(args)
//!                    │
//!                    ├─ perform_count += 1            (every request)
//!                    ├─ admission decision            (AdmissionMode)
//!                    │     ├─ Drop:        pre-settled Cancelled instance
//!                    │     ├─ Restartable: cancel oldest active, then submit
//!                    │     ├─ KeepLatest:  clear pending, then submit
//!                    │     └─ Enqueue:     submit
//!                    ▼
//!            ┌───────────────────────────────────────────────┐
//!            │  TaskQueue (bounded admission)                │
//!            │  - limit (0 = unbounded)                      │
//!            │  - active: ordered set (start order)          │
//!            │  - pending: FIFO start-thunks                 │
//!            └──────┬────────────────────────────────────────┘
//!                   ▼
//!             driver task (one per started submission)
//!                   ├─ race body vs CancellationToken
//!                   ├─ settle watch cell (exactly once)
//!                   ├─ publish terminal Event ──► Bus ──► SubscriberSet
//!                   └─ advance queue (release slot, start next)
//! ```
//!
//! ### Instance lifecycle
//! ```text
//! Pending ──► Succeeded   value kept, instance becomes `last_successful`
//!         ──► Failed      error kept, `is_error == true`
//!         ──► Cancelled   quiet and valueless: never an error,
//!                         `done()` resolves to Ok(None)
//! ```
//!
//! ## Features
//! | Area            | Description                                               | Key types / traits                  |
//! |-----------------|-----------------------------------------------------------|-------------------------------------|
//! | **Queue**       | Bounded FIFO admission with cooperative cancellation.     | [`TaskQueue`], [`Ticket`]           |
//! | **Policies**    | Enqueue / Drop / Restartable / KeepLatest admission.      | [`AdmissionMode`], [`TaskOptions`]  |
//! | **Controller**  | Lifecycle state over one queue (`last`, counters).        | [`TaskController`], [`TaskState`]   |
//! | **Instances**   | Cancel / await / peek handles per perform.                | [`TaskInstance`]                    |
//! | **Tasks**       | Define tasks as trait impls or plain closures.            | [`Task`], [`TaskFn`], [`TaskRef`]   |
//! | **Errors**      | Failure vs cancellation, kept strictly apart.             | [`TaskError`]                       |
//! | **Events**      | Sequenced lifecycle events over a broadcast bus.          | [`Event`], [`EventKind`], [`Bus`]   |
//! | **Subscribers** | Non-blocking fan-out with panic isolation.                | [`Subscribe`], [`SubscriberSet`]    |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskgate::{AdmissionMode, TaskController, TaskError, TaskFn, TaskOptions, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     // A task is a named closure receiving its arguments and a token.
//!     let double: TaskRef<u32, u32> =
//!         TaskFn::arc("double", |n: u32, _ctx: CancellationToken| async move {
//!             Ok::<_, TaskError>(n * 2)
//!         });
//!
//!     let controller = TaskController::builder(double)
//!         .with_options(TaskOptions::new(AdmissionMode::Enqueue))
//!         .build();
//!
//!     let instance = controller.perform(21);
//!     assert_eq!(instance.done().await, Ok(Some(42)));
//!     assert_eq!(controller.perform_count(), 1);
//!     assert!(controller.last_successful().is_some());
//! }
//! ```
//!
//! ## Cancellation model
//! Cancellation is cooperative: requesting it signals the task's
//! `CancellationToken`, and the body is dropped at its next suspension point
//! (its `Drop` glue runs exactly once). Cancelling a pending, not-yet-started
//! submission removes it from the queue without ever invoking the body.
//! Cancelling settled work is a no-op. There is no built-in timeout; race
//! [`TaskInstance::done`] against a timer and call
//! [`TaskInstance::cancel`] to compose one.

mod controller;
mod error;
mod events;
mod queue;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use controller::{
    AdmissionMode, ControllerBuilder, TaskController, TaskInstance, TaskOptions, TaskState,
};
pub use error::TaskError;
pub use events::{Bus, Event, EventKind};
pub use queue::{ActiveHandle, StartThunk, TaskOutcome, TaskQueue, Ticket};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, Task, TaskFn, TaskRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
