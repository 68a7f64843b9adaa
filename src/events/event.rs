//! # Lifecycle events emitted by the queue and the controller.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Queue events**: admission flow (enqueued, started)
//! - **Terminal events**: settlement of an instance (succeeded, failed, canceled)
//! - **Policy events**: admission-control decisions (dropped, preempted)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! task label, the instance id assigned by the queue, and free-form reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use taskgate::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("refresh")
//!     .with_instance(3)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("refresh"));
//! assert_eq!(ev.instance, Some(3));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Queue events ===
    /// Submission deferred because the queue is at its concurrency bound.
    ///
    /// Sets:
    /// - `task`: task label
    /// - `instance`: queue-assigned instance id
    TaskEnqueued,

    /// Submission began executing (its start-thunk was invoked).
    ///
    /// Sets:
    /// - `task`: task label
    /// - `instance`: queue-assigned instance id
    TaskStarted,

    // === Terminal events ===
    /// Instance settled with a value.
    ///
    /// Sets:
    /// - `task`: task label
    /// - `instance`: queue-assigned instance id
    TaskSucceeded,

    /// Instance settled with an error (body failure or captured panic).
    ///
    /// Sets:
    /// - `task`: task label
    /// - `instance`: queue-assigned instance id
    /// - `reason`: failure message
    TaskFailed,

    /// Instance settled cancelled, whether or not it ever started.
    ///
    /// Sets:
    /// - `task`: task label
    /// - `instance`: queue-assigned instance id
    TaskCanceled,

    // === Policy events ===
    /// A saturated `Drop`-mode perform was rejected without invoking the work.
    ///
    /// Sets:
    /// - `task`: task label
    /// - `reason`: "saturated"
    TaskDropped,

    /// An admission policy cancelled already-admitted work to make room.
    ///
    /// Sets:
    /// - `task`: task label
    /// - `reason`: "oldest_active" (restartable) or "pending_cleared" (keep-latest)
    TaskPreempted,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Label of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Queue-assigned instance id, if the submission reached the queue.
    pub instance: Option<u64>,
    /// Human-readable reason (errors, preemption details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            instance: None,
            reason: None,
        }
    }

    /// Attaches a task label.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a queue-assigned instance id.
    #[inline]
    pub fn with_instance(mut self, instance: u64) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// True for terminal settlement events.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::TaskSucceeded | EventKind::TaskFailed | EventKind::TaskCanceled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::TaskStarted);
        let b = Event::new(EventKind::TaskStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builder_sets_fields() {
        let ev = Event::new(EventKind::TaskPreempted)
            .with_task("sync")
            .with_instance(7)
            .with_reason("oldest_active");
        assert_eq!(ev.task.as_deref(), Some("sync"));
        assert_eq!(ev.instance, Some(7));
        assert_eq!(ev.reason.as_deref(), Some("oldest_active"));
        assert!(!ev.is_terminal());
        assert!(Event::new(EventKind::TaskCanceled).is_terminal());
    }
}
