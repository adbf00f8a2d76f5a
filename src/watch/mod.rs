// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the per-task watch globs from the task catalog.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - (Optionally) skipping triggers when a task's watched files hash the
//!   same as on its previous trigger.
//!
//! It does **not** know about the DAG; it only turns filesystem changes into
//! task-level triggers.

pub mod cache;
pub mod event_handler;
pub mod hash;
pub mod patterns;
pub mod watcher;

pub use event_handler::ChangeDispatcher;
pub use hash::{HashStore, MemoryHashStore};
pub use patterns::{build_task_watch_profiles, TaskWatchProfile};
pub use watcher::{spawn_watcher, WatcherHandle};
