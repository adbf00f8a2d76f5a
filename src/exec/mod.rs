// src/exec/mod.rs

//! Task execution layer.
//!
//! Runs the transform body of each scheduled task on tokio's blocking pool
//! and reports back to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the loop that spawns one Tokio task per
//!   scheduled task.
//! - [`task_runner`] runs a single task and publishes its reload notice.
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `RealExecutorBackend` the runtime uses in production, which tests can
//!   replace with a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend, TaskEnv};
pub use executor_loop::spawn_executor;
