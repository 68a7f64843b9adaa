//! # Task controller: admission policies over one queue.
//!
//! [`TaskController`] wraps a single [`TaskQueue`] and implements the four
//! admission modes plus the per-instance lifecycle. Every
//! [`perform`](TaskController::perform) is one admission request:
//!
//! ```text
//! perform(args)
//!   ├─ perform_count += 1                      (always, whatever the outcome)
//!   ├─ saturated = active_count >= bound       (never, when unbounded)
//!   ├─ Enqueue      ──► submit (FIFO wait when saturated)
//!   ├─ Drop         ──► saturated? return pre-settled Cancelled instance,
//!   │                   work never invoked, `last` untouched
//!   ├─ Restartable  ──► saturated? cancel oldest active, then submit
//!   ├─ KeepLatest   ──► saturated and pending? clear pending, then submit
//!   └─ admitted     ──► new Pending instance becomes `last`;
//!                       a watcher records it in `last_successful` on success
//! ```
//!
//! ## Rules
//! - `perform_count` increments exactly once per call.
//! - `last` is replaced only by admitted (non-dropped) requests.
//! - `last_successful` is never reset by failures or cancellations.
//! - `is_running` derives from the queue's active count.
//! - Dropping the controller cancels all active work and clears pending; no
//!   queued work outlives its controller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::queue::TaskQueue;
use crate::tasks::{BoxTaskFuture, TaskRef};

use super::admission::AdmissionMode;
use super::builder::ControllerBuilder;
use super::instance::TaskInstance;
use super::options::TaskOptions;

/// Snapshot of a controller's observable state.
#[derive(Clone)]
pub struct TaskState<T> {
    /// True while at least one instance is executing.
    pub is_running: bool,
    /// Complement of `is_running`.
    pub is_idle: bool,
    /// Admission requests so far, dropped ones included.
    pub perform_count: u64,
    /// Most recently admitted instance.
    pub last: Option<TaskInstance<T>>,
    /// Most recent instance that settled with a value.
    pub last_successful: Option<TaskInstance<T>>,
}

struct ControllerState<T> {
    perform_count: u64,
    last: Option<TaskInstance<T>>,
    last_successful: Option<TaskInstance<T>>,
}

/// Admission-controlled executor for one task definition.
///
/// Created via [`TaskController::builder`] (or [`TaskController::new`] when no
/// subscribers are needed).
pub struct TaskController<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    task: TaskRef<A, T>,
    options: TaskOptions,
    queue: Arc<TaskQueue<T>>,
    bus: Bus,
    runtime_token: CancellationToken,
    state: Arc<Mutex<ControllerState<T>>>,
}

impl<A, T> TaskController<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Starts building a controller for `task`.
    pub fn builder(task: TaskRef<A, T>) -> ControllerBuilder<A, T> {
        ControllerBuilder::new(task)
    }

    /// Creates a controller with the given options and no subscribers.
    pub fn new(task: TaskRef<A, T>, options: TaskOptions) -> Self {
        Self::builder(task).with_options(options).build()
    }

    pub(super) fn assemble(
        task: TaskRef<A, T>,
        options: TaskOptions,
        queue: Arc<TaskQueue<T>>,
        bus: Bus,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            task,
            options,
            queue,
            bus,
            runtime_token,
            state: Arc::new(Mutex::new(ControllerState {
                perform_count: 0,
                last: None,
                last_successful: None,
            })),
        }
    }

    /// Requests one execution of the task with `args`.
    ///
    /// Applies the configured admission mode and synchronously returns the
    /// instance handle; see the module docs for the per-mode behavior.
    pub fn perform(&self, args: A) -> TaskInstance<T> {
        self.lock().perform_count += 1;

        let mode = self.options.effective_mode();
        let limit = self.queue.limit();
        let saturated = limit > 0 && self.queue.active_count() >= limit;

        match mode {
            AdmissionMode::Drop if saturated => {
                self.bus.publish(
                    Event::new(EventKind::TaskDropped)
                        .with_task(self.task.name())
                        .with_reason("saturated"),
                );
                return TaskInstance::dropped();
            }
            AdmissionMode::Restartable if saturated => {
                if let Some(oldest) = self.queue.oldest_active() {
                    self.bus.publish(
                        Event::new(EventKind::TaskPreempted)
                            .with_task(self.task.name())
                            .with_instance(oldest.id())
                            .with_reason("oldest_active"),
                    );
                    oldest.cancel();
                }
            }
            AdmissionMode::KeepLatest if saturated => {
                if self.queue.pending_count() > 0 {
                    self.bus.publish(
                        Event::new(EventKind::TaskPreempted)
                            .with_task(self.task.name())
                            .with_reason("pending_cleared"),
                    );
                    self.queue.empty_pending();
                }
            }
            _ => {}
        }

        let instance = self.submit(args);
        self.lock().last = Some(instance.clone());
        self.watch(instance.clone());
        instance
    }

    /// Cancels all active work and clears pending admissions.
    pub fn cancel_all(&self) {
        self.queue.cancel_all();
    }

    /// Admission requests so far, dropped ones included.
    pub fn perform_count(&self) -> u64 {
        self.lock().perform_count
    }

    /// True while at least one instance is executing.
    pub fn is_running(&self) -> bool {
        self.queue.active_count() != 0
    }

    /// Complement of [`is_running`](TaskController::is_running).
    pub fn is_idle(&self) -> bool {
        !self.is_running()
    }

    /// Most recently admitted instance.
    pub fn last(&self) -> Option<TaskInstance<T>> {
        self.lock().last.clone()
    }

    /// Most recent instance that settled with a value.
    pub fn last_successful(&self) -> Option<TaskInstance<T>> {
        self.lock().last_successful.clone()
    }

    /// Consistent snapshot of the observable state.
    pub fn state(&self) -> TaskState<T> {
        let st = self.lock();
        let is_running = self.queue.active_count() != 0;
        TaskState {
            is_running,
            is_idle: !is_running,
            perform_count: st.perform_count,
            last: st.last.clone(),
            last_successful: st.last_successful.clone(),
        }
    }

    /// The underlying queue, for introspection.
    pub fn queue(&self) -> &Arc<TaskQueue<T>> {
        &self.queue
    }

    /// The admission configuration this controller was built with.
    pub fn options(&self) -> TaskOptions {
        self.options
    }

    /// New receiver of this controller's lifecycle events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    fn submit(&self, args: A) -> TaskInstance<T> {
        let task = Arc::clone(&self.task);
        let ticket = self
            .queue
            .submit(self.task.name(), move |ctx| -> BoxTaskFuture<T> {
                Box::pin(async move { task.run(args, ctx).await })
            });
        TaskInstance::admitted(ticket)
    }

    /// Observes one admitted instance and records it as `last_successful`
    /// when it settles with a value.
    fn watch(&self, instance: TaskInstance<T>) {
        let state = Arc::clone(&self.state);
        let token = self.runtime_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                settled = instance.done() => {
                    if matches!(settled, Ok(Some(_))) {
                        let mut st = state.lock().unwrap_or_else(PoisonError::into_inner);
                        st.last_successful = Some(instance.clone());
                    }
                }
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A, T> Drop for TaskController<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.runtime_token.cancel();
        self.queue.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::tasks::TaskFn;
    use std::time::Duration;
    use tokio::task::yield_now;
    use tokio::time::sleep;

    /// Lets already-woken tasks (drivers, watchers) run to their next
    /// suspension point.
    async fn drain() {
        for _ in 0..4 {
            yield_now().await;
        }
    }

    fn recording_task(
        ms: u64,
        log: Arc<Mutex<Vec<u32>>>,
    ) -> TaskRef<u32, u32> {
        TaskFn::arc("recorder", move |value: u32, _ctx: CancellationToken| {
            let log = Arc::clone(&log);
            async move {
                sleep(Duration::from_millis(ms)).await;
                log.lock().unwrap().push(value);
                Ok::<_, TaskError>(value)
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state_and_successful_run() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let controller = TaskController::new(
            recording_task(100, Arc::clone(&log)),
            TaskOptions::new(AdmissionMode::Enqueue),
        );

        let state = controller.state();
        assert!(!state.is_running);
        assert!(state.is_idle);
        assert_eq!(state.perform_count, 0);
        assert!(state.last.is_none());
        assert!(state.last_successful.is_none());

        let instance = controller.perform(42);
        assert!(controller.is_running());
        assert_eq!(controller.perform_count(), 1);
        assert_eq!(controller.last().unwrap().id(), instance.id());
        assert!(controller.last_successful().is_none());

        assert_eq!(instance.done().await, Ok(Some(42)));
        drain().await;

        let state = controller.state();
        assert!(!state.is_running);
        assert_eq!(state.perform_count, 1);
        assert_eq!(state.last_successful.unwrap().peek(), Some(42));
        assert!(instance.is_successful());
        assert_eq!(*log.lock().unwrap(), vec![42]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_mode_rejects_saturated_performs() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let controller = TaskController::new(
            recording_task(500, Arc::clone(&log)),
            TaskOptions::new(AdmissionMode::Drop),
        );

        let admitted = controller.perform(1);
        let rejected = controller.perform(2);

        assert_eq!(controller.perform_count(), 2);
        assert!(rejected.is_cancelled());
        assert!(!rejected.is_error());
        assert_eq!(rejected.done().await, Ok(None));
        // The rejected work was never invoked and `last` still points at the
        // admitted instance.
        assert_eq!(controller.last().unwrap().id(), admitted.id());
        assert_eq!(controller.queue().pending_count(), 0);

        assert_eq!(admitted.done().await, Ok(Some(1)));
        assert_eq!(*log.lock().unwrap(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restartable_preempts_oldest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let controller = TaskController::new(
            recording_task(500, Arc::clone(&log)),
            TaskOptions::new(AdmissionMode::Restartable),
        );

        let first = controller.perform(1);
        drain().await;
        let second = controller.perform(2);

        assert_eq!(first.done().await, Ok(None));
        assert!(first.is_cancelled());
        assert!(!first.is_error());

        assert_eq!(second.done().await, Ok(Some(2)));
        assert_eq!(*log.lock().unwrap(), vec![2]);
        assert_eq!(controller.perform_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restartable_spares_newer_sibling() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let controller = TaskController::new(
            recording_task(300, Arc::clone(&log)),
            TaskOptions::new(AdmissionMode::Restartable).max_concurrency(2),
        );

        let first = controller.perform(1);
        let second = controller.perform(2);
        drain().await;
        let third = controller.perform(3);

        assert_eq!(first.done().await, Ok(None));
        assert_eq!(second.done().await, Ok(Some(2)));
        assert_eq!(third.done().await, Ok(Some(3)));
        let mut finished = log.lock().unwrap().clone();
        finished.sort_unstable();
        assert_eq!(finished, vec![2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_latest_collapses_pending_to_newest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let controller = TaskController::new(
            recording_task(200, Arc::clone(&log)),
            TaskOptions::new(AdmissionMode::KeepLatest),
        );

        let active = controller.perform(1);
        let stale = controller.perform(2);
        let newest = controller.perform(3);

        assert_eq!(controller.queue().pending_count(), 1);
        assert_eq!(stale.done().await, Ok(None));
        assert!(stale.is_cancelled());

        assert_eq!(active.done().await, Ok(Some(1)));
        assert_eq!(newest.done().await, Ok(Some(3)));
        // The stale middle request never ran.
        assert_eq!(*log.lock().unwrap(), vec![1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_serializes_in_submission_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let controller = TaskController::new(
            recording_task(50, Arc::clone(&log)),
            TaskOptions::new(AdmissionMode::Enqueue),
        );

        let instances: Vec<_> = (1..=3).map(|i| controller.perform(i)).collect();
        assert_eq!(controller.queue().active_count(), 1);
        assert_eq!(controller.queue().pending_count(), 2);

        for (i, instance) in instances.iter().enumerate() {
            assert_eq!(instance.done().await, Ok(Some(i as u32 + 1)));
        }
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(controller.perform_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_successful_survives_failure_and_cancellation() {
        let task: TaskRef<u32, u32> =
            TaskFn::arc("mixed", |value: u32, _ctx: CancellationToken| async move {
                sleep(Duration::from_millis(10)).await;
                if value == 0 {
                    Err(TaskError::failed("zero is not a value"))
                } else {
                    Ok(value)
                }
            });
        let controller = TaskController::new(task, TaskOptions::new(AdmissionMode::Enqueue));

        let ok = controller.perform(5);
        assert_eq!(ok.done().await, Ok(Some(5)));
        drain().await;

        let failing = controller.perform(0);
        assert_eq!(
            failing.done().await,
            Err(TaskError::failed("zero is not a value"))
        );
        drain().await;
        assert!(failing.is_error());
        assert!(failing.error().is_some());
        assert_eq!(failing.peek(), None);
        assert_eq!(controller.last().unwrap().id(), failing.id());
        assert_eq!(controller.last_successful().unwrap().peek(), Some(5));

        let cancelled = controller.perform(7);
        cancelled.cancel();
        assert_eq!(cancelled.done().await, Ok(None));
        drain().await;
        assert_eq!(controller.last_successful().unwrap().peek(), Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_settles_everything_quietly() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let controller = TaskController::new(
            recording_task(1000, Arc::clone(&log)),
            TaskOptions::new(AdmissionMode::Enqueue),
        );

        let running = controller.perform(1);
        let waiting = controller.perform(2);
        controller.cancel_all();

        assert_eq!(running.done().await, Ok(None));
        assert_eq!(waiting.done().await, Ok(None));
        assert!(controller.is_idle());
        assert_eq!(controller.queue().pending_count(), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_does_not_cancel_work() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let controller = TaskController::new(
            recording_task(100, Arc::clone(&log)),
            TaskOptions::new(AdmissionMode::Enqueue),
        );

        drop(controller.perform(9));
        sleep(Duration::from_millis(500)).await;
        drain().await;

        assert_eq!(*log.lock().unwrap(), vec![9]);
        assert_eq!(controller.last_successful().unwrap().peek(), Some(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_controller_cancels_outstanding_work() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let controller = TaskController::new(
            recording_task(1000, Arc::clone(&log)),
            TaskOptions::new(AdmissionMode::Enqueue),
        );
        let instance = controller.perform(1);
        drop(controller);

        assert_eq!(instance.done().await, Ok(None));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_events_are_published() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let controller = TaskController::new(
            recording_task(10, Arc::clone(&log)),
            TaskOptions::new(AdmissionMode::Drop),
        );
        let mut rx = controller.subscribe();

        let admitted = controller.perform(1);
        let _rejected = controller.perform(2);
        admitted.done().await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::TaskStarted));
        assert!(kinds.contains(&EventKind::TaskDropped));
        assert!(kinds.contains(&EventKind::TaskSucceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_default_never_saturates() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let controller = TaskController::new(
            recording_task(50, Arc::clone(&log)),
            TaskOptions::default(),
        );
        let instances: Vec<_> = (0..8).map(|i| controller.perform(i)).collect();
        assert_eq!(controller.queue().active_count(), 8);
        assert_eq!(controller.queue().pending_count(), 0);
        for instance in instances {
            assert!(instance.done().await.unwrap().is_some());
        }
    }
}
