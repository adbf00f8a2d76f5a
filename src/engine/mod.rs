// src/engine/mod.rs

//! Orchestration engine.
//!
//! One DAG run is "clean, then every transform that was triggered". The
//! engine decides when runs start, which tasks join them, and what happens
//! to source changes that arrive while a run is still writing output.
//!
//! [`core`] is the synchronous state machine; [`runtime`] feeds it events
//! from the watcher, the executor and Ctrl-C, and carries out its commands.

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Startup: `build` and `dev` trigger the graph roots.
    Manual,
    /// A watched source file changed.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Stop after the first idle moment with nothing queued (`build`).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// Sent by the executor for every dispatched task.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Ctrl-C, or `dev` tearing down.
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use crate::types::TriggerWhileRunningBehaviour;
pub use runtime::Runtime;
