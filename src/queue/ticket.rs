//! # Settlement handles returned by the queue.
//!
//! [`Ticket`] is the observable handle [`TaskQueue::submit`](crate::TaskQueue::submit)
//! returns synchronously for every submission, whether or not the work ever
//! starts. It watches the submission's settlement cell and routes
//! cancellation back through the queue, so cancelling a not-yet-started
//! submission removes it from the pending list without invoking its body.
//!
//! Observation is **weak**: a `Ticket` (or any clone of it) never keeps the
//! underlying work alive and never blocks its cancellation. Dropping every
//! ticket leaves the task running to completion.

use std::sync::Weak;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

use super::core::TaskQueue;

/// Terminal settlement of a submission.
pub type TaskOutcome<T> = Result<T, TaskError>;

pub(super) type SettleCell<T> = watch::Sender<Option<TaskOutcome<T>>>;
pub(super) type SettleWatch<T> = watch::Receiver<Option<TaskOutcome<T>>>;

/// Observable handle for one submission.
///
/// Cheap to clone; all clones observe the same settlement cell. The cell is
/// written exactly once, so a settled ticket never changes again.
pub struct Ticket<T> {
    id: u64,
    queue: Weak<TaskQueue<T>>,
    outcome: SettleWatch<T>,
}

impl<T> Clone for Ticket<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            queue: self.queue.clone(),
            outcome: self.outcome.clone(),
        }
    }
}

impl<T> Ticket<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(super) fn live(id: u64, queue: Weak<TaskQueue<T>>, outcome: SettleWatch<T>) -> Self {
        Self { id, queue, outcome }
    }

    /// Creates a ticket that is already settled, detached from any queue.
    ///
    /// Used for admissions that never reach the queue (drop-mode rejects).
    /// Its id is 0, the sentinel for "never submitted".
    pub fn settled(outcome: TaskOutcome<T>) -> Self {
        let (tx, rx) = watch::channel(Some(outcome));
        drop(tx);
        Self {
            id: 0,
            queue: Weak::new(),
            outcome: rx,
        }
    }

    /// Queue-assigned instance id (`0` when the submission never reached a
    /// queue).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Requests cancellation.
    ///
    /// Pending submissions are removed from the queue and settle Cancelled
    /// without their body ever being invoked; active submissions are signalled
    /// cooperatively and stop at their next suspension point. Safe to call
    /// repeatedly; a no-op once the ticket is settled or the queue is gone.
    pub fn cancel(&self) {
        if let Some(queue) = self.queue.upgrade() {
            queue.cancel(self.id);
        }
    }

    /// True once the submission has settled.
    pub fn is_finished(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Last known resolved value, `None` while pending or unless the
    /// submission succeeded.
    pub fn peek(&self) -> Option<T> {
        self.outcome
            .borrow()
            .as_ref()
            .and_then(|out| out.as_ref().ok().cloned())
    }

    /// Current settlement, if any.
    pub(crate) fn settlement(&self) -> Option<TaskOutcome<T>> {
        self.outcome.borrow().clone()
    }

    /// Waits for settlement and returns it.
    ///
    /// Weak observation: awaiting this does not extend the submission's
    /// lifetime. If the queue is torn down before the submission settles, the
    /// outcome is reported as cancelled.
    pub async fn outcome(&self) -> TaskOutcome<T> {
        let mut rx = self.outcome.clone();
        let result = match rx.wait_for(|out| out.is_some()).await {
            Ok(settled) => match &*settled {
                Some(out) => out.clone(),
                None => Err(TaskError::Canceled),
            },
            Err(_) => Err(TaskError::Canceled),
        };
        result
    }
}

/// Handle to one currently active submission, as returned by
/// [`TaskQueue::oldest_active`](crate::TaskQueue::oldest_active).
///
/// Used by preempting admission policies to cancel the oldest running work.
#[derive(Clone)]
pub struct ActiveHandle {
    pub(super) id: u64,
    pub(super) token: CancellationToken,
}

impl ActiveHandle {
    /// Queue-assigned instance id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Requests cooperative cancellation of this active submission.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}
