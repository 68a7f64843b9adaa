//! # Controller builder.
//!
//! Assembles a [`TaskController`]: admission options, event-bus capacity, and
//! optional subscribers. When subscribers are present, `build` spawns a
//! listener that fans bus events out to the [`SubscriberSet`] and shuts it
//! down when the controller is dropped; building with subscribers therefore
//! requires a running Tokio runtime.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::events::Bus;
use crate::queue::TaskQueue;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::TaskRef;

use super::admission::AdmissionMode;
use super::core::TaskController;
use super::options::TaskOptions;

/// Builder for [`TaskController`].
pub struct ControllerBuilder<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    task: TaskRef<A, T>,
    options: TaskOptions,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bus_capacity: usize,
}

impl<A, T> ControllerBuilder<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub(super) fn new(task: TaskRef<A, T>) -> Self {
        Self {
            task,
            options: TaskOptions::default(),
            subscribers: Vec::new(),
            bus_capacity: 1024,
        }
    }

    /// Replaces the admission options wholesale.
    pub fn with_options(mut self, options: TaskOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the admission mode (forcing its default bound of 1 unless a bound
    /// is set explicitly).
    pub fn with_mode(mut self, mode: AdmissionMode) -> Self {
        self.options.mode = Some(mode);
        self
    }

    /// Sets the concurrency bound (`0` = unbounded).
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.options.max_concurrency = Some(limit);
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Adds a batch of subscribers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Sets the event-bus ring-buffer capacity (min 1, clamped by the bus).
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Builds the controller and wires up the subscriber listener.
    pub fn build(self) -> TaskController<A, T> {
        let bus = Bus::new(self.bus_capacity);
        let runtime_token = CancellationToken::new();

        if !self.subscribers.is_empty() {
            spawn_subscriber_listener(
                &bus,
                SubscriberSet::new(self.subscribers),
                runtime_token.clone(),
            );
        }

        let queue = TaskQueue::new(self.options.effective_limit(), bus.clone());
        TaskController::assemble(self.task, self.options, queue, bus, runtime_token)
    }
}

/// Fans bus events out to the subscriber set until the controller goes away.
fn spawn_subscriber_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        }
        set.shutdown().await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::events::{Event, EventKind};
    use crate::tasks::TaskFn;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::task::yield_now;
    use tokio::time::sleep;
    use tokio_util::sync::CancellationToken;

    struct Collector {
        kinds: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Collector {
        async fn on_event(&self, event: &Event) {
            self.kinds.lock().unwrap().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "collector"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_observe_lifecycle() {
        let collector = Arc::new(Collector {
            kinds: Mutex::new(Vec::new()),
        });
        let task: TaskRef<(), u32> =
            TaskFn::arc("noop", |_args: (), _ctx: CancellationToken| async move {
                sleep(Duration::from_millis(5)).await;
                Ok::<_, TaskError>(1)
            });
        let controller = TaskController::builder(task)
            .with_mode(AdmissionMode::Enqueue)
            .with_subscriber(Arc::clone(&collector) as Arc<dyn Subscribe>)
            .build();

        let first = controller.perform(());
        let second = controller.perform(());
        assert_eq!(first.done().await, Ok(Some(1)));
        assert_eq!(second.done().await, Ok(Some(1)));
        for _ in 0..8 {
            yield_now().await;
        }

        let kinds = collector.kinds.lock().unwrap().clone();
        assert!(kinds.contains(&EventKind::TaskStarted));
        assert!(kinds.contains(&EventKind::TaskEnqueued));
        assert!(kinds.contains(&EventKind::TaskSucceeded));
    }

    #[tokio::test]
    async fn test_builder_applies_options() {
        let task: TaskRef<(), u32> =
            TaskFn::arc("noop", |_args: (), _ctx: CancellationToken| async move {
                Ok::<_, TaskError>(0)
            });
        let controller = TaskController::builder(task)
            .with_mode(AdmissionMode::KeepLatest)
            .with_max_concurrency(3)
            .build();
        assert_eq!(controller.options().effective_mode(), AdmissionMode::KeepLatest);
        assert_eq!(controller.queue().limit(), 3);
    }
}
