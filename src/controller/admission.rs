//! # Admission-control policy
//!
//! The controller decides what happens when [`perform`](crate::TaskController::perform)
//! is called while the queue is saturated (active count at the concurrency
//! bound). The admission mode picks one of four answers.
//!
//! ## Variants
//! - `Enqueue`: wait in FIFO order (unbounded fairness).
//! - `Drop`: reject the new request without ever invoking it.
//! - `Restartable`: cancel the **oldest** active task; the new request takes
//!   the freed slot.
//! - `KeepLatest`: cancel waiting work so at most one request queues behind
//!   the running one; the active task is untouched.
//!
//! ## Invariants
//! - Saturation only exists under a finite bound; with an unbounded queue all
//!   modes behave like `Enqueue`.
//! - Queued requests start strictly in submission order.
//! - Preemption is cooperative: the cancelled task stops at its next
//!   suspension point and releases its slot through the normal completion
//!   path.

/// Policy controlling how a `perform` is admitted when the queue is saturated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdmissionMode {
    /// Queue the request (FIFO order).
    ///
    /// Use when:
    /// - All requests must execute
    /// - Order matters
    /// - Example: sequential write pipeline
    #[default]
    Enqueue,

    /// Reject the request if saturated; the work is never invoked.
    ///
    /// Use when:
    /// - Redundant work should be avoided while one is in flight
    /// - Example: a save button that ignores double-clicks
    Drop,

    /// Cancel the oldest running task and admit the new request.
    ///
    /// Use when:
    /// - A new request invalidates the old one
    /// - Priority goes to the latest submission
    /// - Example: type-ahead search (new keystroke cancels old query)
    Restartable,

    /// Keep the running task; collapse waiting work to the newest request.
    ///
    /// Use when:
    /// - In-flight work must finish, but stale queued work is worthless
    /// - Example: refresh requests while one refresh is already running
    KeepLatest,
}

impl AdmissionMode {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AdmissionMode::Enqueue => "enqueue",
            AdmissionMode::Drop => "drop",
            AdmissionMode::Restartable => "restartable",
            AdmissionMode::KeepLatest => "keep_latest",
        }
    }
}
