//! # Concurrency-limited task queue.
//!
//! The bounded admission layer: a concurrency limit, an insertion-ordered
//! active set, and a FIFO pending list of deferred start-thunks.
//!
//! ## Contents
//! - [`TaskQueue`] - submit/cancel/introspection over the two collections
//! - [`Ticket`] - settlement handle returned synchronously by every submit
//! - [`ActiveHandle`] - cancellation handle for the oldest active submission
//! - [`StartThunk`], [`TaskOutcome`] - the submission and settlement types

mod core;
mod ticket;

pub use core::{StartThunk, TaskQueue};
pub use ticket::{ActiveHandle, TaskOutcome, Ticket};
