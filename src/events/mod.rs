//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the task queue and the controller.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `TaskQueue` drivers (enqueued/started/terminal events) and
//!   `TaskController::perform` (dropped/preempted policy events).
//! - **Consumers**: the controller's subscriber listener (fans out to
//!   `SubscriberSet`) and any receiver obtained from
//!   [`TaskController::subscribe`](crate::TaskController::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
