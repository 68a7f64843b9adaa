//! # Admission-controlled task execution.
//!
//! The controller layer on top of the task queue: admission modes,
//! per-instance lifecycle, and the state the caller observes.
//!
//! ## Contents
//! - [`TaskController`] - policy dispatch and lifecycle bookkeeping
//! - [`ControllerBuilder`] - options, bus capacity, subscribers
//! - [`AdmissionMode`], [`TaskOptions`] - the policy configuration surface
//! - [`TaskInstance`], [`TaskState`] - what callers get back

pub mod admission;
pub mod options;

mod builder;
mod core;
mod instance;

pub use admission::AdmissionMode;
pub use builder::ControllerBuilder;
pub use core::{TaskController, TaskState};
pub use instance::TaskInstance;
pub use options::TaskOptions;
