//! # Example: admission_modes
//!
//! Walks through the four admission modes against the same slow task.
//!
//! Shows how to:
//! - Reject redundant work with [`AdmissionMode::Drop`]
//! - Preempt stale work with [`AdmissionMode::Restartable`]
//! - Collapse waiting work with [`AdmissionMode::KeepLatest`]
//! - Watch lifecycle events through the built-in `LogWriter`
//!
//! ## Run
//! ```bash
//! cargo run --example admission_modes --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskgate::{
    AdmissionMode, LogWriter, Subscribe, TaskController, TaskError, TaskFn, TaskOptions, TaskRef,
};
use tokio_util::sync::CancellationToken;

fn slow_double() -> TaskRef<u32, u32> {
    TaskFn::arc("slow-double", |n: u32, ctx: CancellationToken| async move {
        for _ in 0..5 {
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        Ok(n * 2)
    })
}

fn controller_with(mode: AdmissionMode) -> TaskController<u32, u32> {
    TaskController::builder(slow_double())
        .with_options(TaskOptions::new(mode))
        .with_subscriber(Arc::new(LogWriter) as Arc<dyn Subscribe>)
        .build()
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("=== admission_modes example ===");

    // 1. Enqueue: everything runs, strictly in submission order.
    println!("\n-- enqueue: saturated performs wait their turn --");
    let controller = controller_with(AdmissionMode::Enqueue);
    let a = controller.perform(1);
    let b = controller.perform(2);
    println!("a -> {:?}", a.done().await);
    println!("b -> {:?}", b.done().await);
    println!("performs: {}", controller.perform_count());

    // 2. Drop: a perform while busy is rejected, its body never runs.
    println!("\n-- drop: second perform while busy is rejected --");
    let controller = controller_with(AdmissionMode::Drop);
    let first = controller.perform(3);
    let rejected = controller.perform(4);
    assert!(rejected.is_cancelled());
    println!("first    -> {:?}", first.done().await);
    println!("rejected -> {:?}", rejected.done().await);

    // 3. Restartable: the newest perform wins, the oldest is cancelled.
    println!("\n-- restartable: new perform cancels the oldest active --");
    let controller = controller_with(AdmissionMode::Restartable);
    let stale = controller.perform(5);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let fresh = controller.perform(6);
    println!("stale -> {:?}", stale.done().await);
    println!("fresh -> {:?}", fresh.done().await);

    // 4. KeepLatest: the running task finishes, waiting work collapses to
    //    the newest request.
    println!("\n-- keep_latest: stale queued work is discarded --");
    let controller = controller_with(AdmissionMode::KeepLatest);
    let running = controller.perform(7);
    let stale = controller.perform(8);
    let newest = controller.perform(9);
    println!("running -> {:?}", running.done().await);
    println!("stale   -> {:?}", stale.done().await);
    println!("newest  -> {:?}", newest.done().await);

    // Let the subscriber worker flush its queue before exiting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("\n=== example completed ===");
}
