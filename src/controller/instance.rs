//! # Task instance handle.
//!
//! [`TaskInstance`] is the value returned from every
//! [`perform`](crate::TaskController::perform): a cheaply cloneable,
//! immutable-once-settled view of one admission. It is decoupled from whether
//! the underlying work ever started; instances for drop-mode rejections are
//! pre-settled Cancelled and side-effect free.
//!
//! ## States
//! Pending, then exactly one of Succeeded, Failed, or Cancelled. Terminal
//! states are final: once settled, every accessor returns the same answer
//! forever. Cancellation is not an error: `is_error` stays false and
//! [`done`](TaskInstance::done) resolves it as `Ok(None)`.

use crate::error::TaskError;
use crate::queue::{TaskOutcome, Ticket};

/// Handle to one admitted (or rejected) perform.
pub struct TaskInstance<T> {
    ticket: Ticket<T>,
}

impl<T> Clone for TaskInstance<T> {
    fn clone(&self) -> Self {
        Self {
            ticket: self.ticket.clone(),
        }
    }
}

impl<T> TaskInstance<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wraps an admitted submission's settlement handle.
    pub(super) fn admitted(ticket: Ticket<T>) -> Self {
        Self { ticket }
    }

    /// A pre-settled Cancelled instance for work that was never admitted.
    pub(super) fn dropped() -> Self {
        Self {
            ticket: Ticket::settled(Err(TaskError::Canceled)),
        }
    }

    /// Queue-assigned instance id (`0` when the work was never admitted).
    pub fn id(&self) -> u64 {
        self.ticket.id()
    }

    /// Requests cancellation.
    ///
    /// Safe to call repeatedly and after settlement (a no-op once terminal).
    /// A pending never-started instance is removed from the queue without its
    /// body ever being invoked.
    pub fn cancel(&self) {
        self.ticket.cancel();
    }

    /// Waits for settlement.
    ///
    /// Returns `Ok(Some(value))` on success, `Ok(None)` on cancellation (a
    /// quiet, valueless completion), and `Err` only for genuine task
    /// failures. This is weak observation: awaiting it does not keep the task
    /// alive, and dropping every handle does not cancel the work.
    pub async fn done(&self) -> Result<Option<T>, TaskError> {
        match self.ticket.outcome().await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_cancellation() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Best-effort peek: the resolved value, or `None` while pending or
    /// unless the instance succeeded.
    pub fn peek(&self) -> Option<T> {
        self.ticket.peek()
    }

    /// The failure, if the instance settled Failed.
    pub fn error(&self) -> Option<TaskError> {
        match self.ticket.settlement() {
            Some(Err(err)) if !err.is_cancellation() => Some(err),
            _ => None,
        }
    }

    /// True once the instance settled with a value.
    pub fn is_successful(&self) -> bool {
        matches!(self.ticket.settlement(), Some(Ok(_)))
    }

    /// True once the instance settled with a genuine failure.
    ///
    /// Never true for cancellation.
    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }

    /// True once the instance settled cancelled (including never-started and
    /// dropped admissions).
    pub fn is_cancelled(&self) -> bool {
        matches!(self.ticket.settlement(), Some(Err(ref err)) if err.is_cancellation())
    }

    /// True once the instance reached any terminal state.
    pub fn is_finished(&self) -> bool {
        self.ticket.is_finished()
    }

    /// True while the instance has not settled.
    pub fn is_pending(&self) -> bool {
        !self.is_finished()
    }

    pub(super) fn settlement(&self) -> Option<TaskOutcome<T>> {
        self.ticket.settlement()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_instance_is_presettled_cancelled() {
        let instance: TaskInstance<u32> = TaskInstance::dropped();
        assert_eq!(instance.id(), 0);
        assert!(instance.is_cancelled());
        assert!(instance.is_finished());
        assert!(!instance.is_error());
        assert!(!instance.is_successful());
        assert_eq!(instance.peek(), None);
        assert_eq!(instance.error(), None);
    }

    #[tokio::test]
    async fn test_dropped_instance_methods_are_side_effect_free() {
        let instance: TaskInstance<u32> = TaskInstance::dropped();
        instance.cancel();
        instance.cancel();
        assert_eq!(instance.done().await, Ok(None));
        assert!(instance.is_cancelled());
    }

    #[test]
    fn test_clone_observes_same_settlement() {
        let instance: TaskInstance<u32> = TaskInstance::dropped();
        let clone = instance.clone();
        assert!(clone.is_cancelled());
        assert_eq!(clone.id(), instance.id());
    }
}
