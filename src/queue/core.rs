//! # Concurrency-limited task queue.
//!
//! [`TaskQueue`] is the bounded admission controller underneath
//! [`TaskController`](crate::TaskController). It owns a concurrency limit, the
//! ordered set of in-flight submissions, and a FIFO list of deferred
//! start-thunks, and it guarantees that completion handling and admission of
//! new work are serialized so the active count never exceeds the limit.
//!
//! ## Submission flow
//! ```text
//! submit(label, thunk)
//!   ├─ active < limit (or unbounded) ──► start now
//!   │      └─► driver task: thunk(token) ─► race body vs token ─► settle cell
//!   │                                                             ─► publish terminal event
//!   │                                                             ─► advance()
//!   └─ saturated ──► pending.push_back(thunk)   (strict FIFO, started by advance)
//!
//! advance(finished)
//!   ├─ remove from active
//!   └─ pop pending head ─► already cancelled? settle Cancelled, pop next
//!                        ─► otherwise occupy slot, start driver
//! ```
//!
//! ## Rules
//! - `submit` always returns a [`Ticket`] synchronously; it never fails.
//! - Pending thunks start in strict FIFO order; no reordering.
//! - The active set preserves start order; [`TaskQueue::oldest_active`] is the
//!   front of that order.
//! - Each settlement cell has exactly one writer, so "finished first" vs
//!   "cancelled first" races resolve to whichever the driver observes, and the
//!   loser is a no-op. Cancelling settled work is silently ignored.
//! - A task's failure (or panic) settles only its own ticket; slot release and
//!   pending advancement always run.
//! - A panic while invoking the thunk itself is captured and settles the
//!   ticket Failed, indistinguishable from an async failure.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::BoxTaskFuture;

use super::ticket::{ActiveHandle, SettleCell, TaskOutcome, Ticket};

/// Zero-argument start function: invoked when a slot frees, begins execution
/// and returns the body's future.
pub type StartThunk<T> = Box<dyn FnOnce(CancellationToken) -> BoxTaskFuture<T> + Send + 'static>;

/// One in-flight submission. Insertion order in `QueueState::active` is start
/// order.
struct ActiveEntry {
    id: u64,
    token: CancellationToken,
}

/// One deferred submission waiting for a slot.
struct PendingEntry<T> {
    id: u64,
    label: Arc<str>,
    token: CancellationToken,
    thunk: StartThunk<T>,
    settle: SettleCell<T>,
}

struct QueueState<T> {
    active: VecDeque<ActiveEntry>,
    pending: VecDeque<PendingEntry<T>>,
    next_id: u64,
}

/// Bounded, cancellable admission controller for async work.
///
/// All mutation of the active/pending collections funnels through
/// `submit`/`advance`/`cancel` under one mutex, which is never held across an
/// await.
pub struct TaskQueue<T> {
    limit: usize,
    bus: Bus,
    weak: Weak<TaskQueue<T>>,
    state: Mutex<QueueState<T>>,
}

impl<T> TaskQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a new queue.
    ///
    /// `limit == 0` means unbounded: every submission starts immediately.
    pub fn new(limit: usize, bus: Bus) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            limit,
            bus,
            weak: weak.clone(),
            state: Mutex::new(QueueState {
                active: VecDeque::new(),
                pending: VecDeque::new(),
                next_id: 1,
            }),
        })
    }

    /// Submits a start-thunk and synchronously returns its settlement handle.
    ///
    /// If a slot is free the thunk is invoked immediately; otherwise it waits
    /// in FIFO order. The returned [`Ticket`] observes the submission whether
    /// or not it ever starts.
    pub fn submit(
        &self,
        label: impl Into<Arc<str>>,
        thunk: impl FnOnce(CancellationToken) -> BoxTaskFuture<T> + Send + 'static,
    ) -> Ticket<T> {
        let label: Arc<str> = label.into();
        let token = CancellationToken::new();
        let (settle, outcome) = watch::channel(None);
        let thunk: StartThunk<T> = Box::new(thunk);

        let mut st = self.lock();
        let id = st.next_id;
        st.next_id += 1;
        if self.has_capacity(&st) {
            st.active.push_back(ActiveEntry {
                id,
                token: token.clone(),
            });
            drop(st);
            self.start(id, label, thunk, token, settle);
        } else {
            st.pending.push_back(PendingEntry {
                id,
                label: Arc::clone(&label),
                token,
                thunk,
                settle,
            });
            drop(st);
            self.bus
                .publish(Event::new(EventKind::TaskEnqueued).with_task(label).with_instance(id));
        }

        Ticket::live(id, self.weak.clone(), outcome)
    }

    /// Cancels one submission by id.
    ///
    /// Pending: removed from the list and settled Cancelled without invoking
    /// its body. Active: cooperative cancellation via its token. Settled or
    /// unknown ids are a no-op.
    pub fn cancel(&self, id: u64) {
        let removed = {
            let mut st = self.lock();
            if let Some(pos) = st.pending.iter().position(|entry| entry.id == id) {
                st.pending.remove(pos)
            } else {
                if let Some(entry) = st.active.iter().find(|entry| entry.id == id) {
                    entry.token.cancel();
                }
                None
            }
        };
        if let Some(entry) = removed {
            self.settle_cancelled(entry);
        }
    }

    /// Clears the pending list and requests cancellation of all active work.
    ///
    /// Dropped pending submissions settle Cancelled immediately; active
    /// bookkeeping still flows through the normal driver path once each task
    /// observes its token.
    pub fn cancel_all(&self) {
        let (drained, tokens) = {
            let mut st = self.lock();
            let drained: Vec<PendingEntry<T>> = st.pending.drain(..).collect();
            let tokens: Vec<CancellationToken> =
                st.active.iter().map(|entry| entry.token.clone()).collect();
            (drained, tokens)
        };
        for entry in drained {
            self.settle_cancelled(entry);
        }
        for token in tokens {
            token.cancel();
        }
    }

    /// Clears the pending list only; active work is unaffected.
    ///
    /// Dropped submissions settle Cancelled so their observers never hang on
    /// work that will provably never run.
    pub fn empty_pending(&self) {
        let drained: Vec<PendingEntry<T>> = self.lock().pending.drain(..).collect();
        for entry in drained {
            self.settle_cancelled(entry);
        }
    }

    /// Number of submissions currently executing.
    pub fn active_count(&self) -> usize {
        self.lock().active.len()
    }

    /// Number of submissions waiting for a slot.
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// The raw concurrency bound (`0` = unbounded).
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The concurrency bound as an `Option` (`None` = unbounded).
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.limit == 0 {
            None
        } else {
            Some(self.limit)
        }
    }

    /// Handle to the oldest currently active submission, if any.
    ///
    /// Active order is start order, so this is the preemption target for
    /// oldest-first policies.
    pub fn oldest_active(&self) -> Option<ActiveHandle> {
        self.lock().active.front().map(|entry| ActiveHandle {
            id: entry.id,
            token: entry.token.clone(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_capacity(&self, st: &QueueState<T>) -> bool {
        self.limit == 0 || st.active.len() < self.limit
    }

    /// Begins execution: publishes `TaskStarted` and spawns the driver that
    /// runs the body, settles the cell, and advances the queue.
    fn start(
        &self,
        id: u64,
        label: Arc<str>,
        thunk: StartThunk<T>,
        token: CancellationToken,
        settle: SettleCell<T>,
    ) {
        self.bus.publish(
            Event::new(EventKind::TaskStarted)
                .with_task(Arc::clone(&label))
                .with_instance(id),
        );
        let Some(queue) = self.weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let outcome = drive(thunk, &token).await;
            queue.finish(id, &label, settle, outcome);
        });
    }

    /// Terminal bookkeeping for one started submission: settle, publish,
    /// release the slot, start the next pending thunk.
    fn finish(&self, id: u64, label: &Arc<str>, settle: SettleCell<T>, outcome: TaskOutcome<T>) {
        let event = match &outcome {
            Ok(_) => Event::new(EventKind::TaskSucceeded),
            Err(err) if err.is_cancellation() => Event::new(EventKind::TaskCanceled),
            Err(err) => Event::new(EventKind::TaskFailed).with_reason(err.as_message()),
        };
        settle.send_replace(Some(outcome));
        self.bus
            .publish(event.with_task(Arc::clone(label)).with_instance(id));
        self.advance(id);
    }

    /// Releases the finished submission's slot and starts the head of the
    /// pending list. Serialized under the state mutex with `submit`, so the
    /// active count never transiently exceeds the limit.
    fn advance(&self, finished: u64) {
        let mut dropped: Vec<PendingEntry<T>> = Vec::new();
        let mut next: Option<PendingEntry<T>> = None;
        {
            let mut st = self.lock();
            st.active.retain(|entry| entry.id != finished);
            while self.has_capacity(&st) {
                match st.pending.pop_front() {
                    None => break,
                    Some(entry) if entry.token.is_cancelled() => dropped.push(entry),
                    Some(entry) => {
                        st.active.push_back(ActiveEntry {
                            id: entry.id,
                            token: entry.token.clone(),
                        });
                        next = Some(entry);
                        break;
                    }
                }
            }
        }
        for entry in dropped {
            self.settle_cancelled(entry);
        }
        if let Some(entry) = next {
            self.start(entry.id, entry.label, entry.thunk, entry.token, entry.settle);
        }
    }

    /// Settles a never-started submission as Cancelled.
    fn settle_cancelled(&self, entry: PendingEntry<T>) {
        entry.settle.send_replace(Some(Err(TaskError::Canceled)));
        self.bus.publish(
            Event::new(EventKind::TaskCanceled)
                .with_task(entry.label)
                .with_instance(entry.id),
        );
    }
}

/// Runs one started submission to settlement.
///
/// The thunk invocation and the body future are both wrapped in
/// `catch_unwind`, and the body races the submission's token: cancellation
/// wins at the next poll boundary, dropping the body (its `Drop` glue is the
/// finalizer and runs exactly once).
async fn drive<T>(thunk: StartThunk<T>, token: &CancellationToken) -> TaskOutcome<T> {
    let body = match panic::catch_unwind(AssertUnwindSafe(|| thunk(token.clone()))) {
        Ok(body) => body,
        Err(payload) => return Err(TaskError::failed(panic_message(payload.as_ref()))),
    };
    match token.run_until_cancelled(AssertUnwindSafe(body).catch_unwind()).await {
        Some(Ok(outcome)) => outcome,
        Some(Err(payload)) => Err(TaskError::failed(panic_message(payload.as_ref()))),
        None => Err(TaskError::Canceled),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
