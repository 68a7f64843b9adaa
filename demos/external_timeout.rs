//! # Example: external_timeout
//!
//! There is no built-in timeout: compose one by racing the instance handle
//! against a timer and cancelling on expiry.
//!
//! ## Flow
//! ```text
//! perform() ──► instance
//!   ├─ tokio::time::timeout(200ms, instance.done())
//!   ├─ Ok(result)  ──► task beat the clock
//!   └─ Err(elapsed)──► instance.cancel()
//!                      done() resolves Ok(None): quiet cancellation
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example external_timeout
//! ```

use std::time::Duration;

use taskgate::{AdmissionMode, TaskController, TaskError, TaskFn, TaskOptions, TaskRef};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let sleepy: TaskRef<u64, &'static str> =
        TaskFn::arc("sleepy", |ms: u64, _ctx: CancellationToken| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok::<_, TaskError>("done")
        });

    let controller = TaskController::new(sleepy, TaskOptions::new(AdmissionMode::Enqueue));

    // Fast enough: the instance settles before the deadline.
    let quick = controller.perform(50);
    match timeout(Duration::from_millis(200), quick.done()).await {
        Ok(result) => println!("quick: finished with {result:?}"),
        Err(_) => unreachable!("50ms task beats a 200ms deadline"),
    }

    // Too slow: cancel on expiry; the instance settles quietly.
    let slow = controller.perform(10_000);
    match timeout(Duration::from_millis(200), slow.done()).await {
        Ok(result) => println!("slow: finished with {result:?}"),
        Err(_) => {
            slow.cancel();
            println!("slow: deadline hit, cancelled -> {:?}", slow.done().await);
            assert!(slow.is_cancelled());
            assert!(!slow.is_error());
        }
    }
}
