//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [enqueued] task=refresh instance=4
//! [started] task=refresh instance=4
//! [succeeded] task=refresh instance=4
//! [failed] task=refresh instance=5 err="error: boom"
//! [canceled] task=refresh instance=6
//! [dropped] task=refresh reason="saturated"
//! [preempted] task=refresh reason="oldest_active"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use; implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("?");
        match e.kind {
            EventKind::TaskEnqueued => {
                println!("[enqueued] task={task} instance={:?}", e.instance);
            }
            EventKind::TaskStarted => {
                println!("[started] task={task} instance={:?}", e.instance);
            }
            EventKind::TaskSucceeded => {
                println!("[succeeded] task={task} instance={:?}", e.instance);
            }
            EventKind::TaskFailed => {
                println!(
                    "[failed] task={task} instance={:?} err={:?}",
                    e.instance, e.reason
                );
            }
            EventKind::TaskCanceled => {
                println!("[canceled] task={task} instance={:?}", e.instance);
            }
            EventKind::TaskDropped => {
                println!("[dropped] task={task} reason={:?}", e.reason);
            }
            EventKind::TaskPreempted => {
                println!("[preempted] task={task} reason={:?}", e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
