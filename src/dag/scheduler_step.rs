// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// Summary of a DAG run, produced when its last task reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: u64,
    /// Sorted names of tasks that succeeded in this run.
    pub succeeded: Vec<TaskName>,
    /// Sorted names of tasks that failed, directly or through a dependency.
    pub failed: Vec<TaskName>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the DAG and make
/// assertions about what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks that were newly marked as failed in this step (including the
    /// task that failed and any dependents).
    pub newly_failed: Vec<TaskName>,
    /// Set when this step finished the current run (the scheduler is now idle).
    pub finished: Option<RunReport>,
}

impl SchedulerStep {
    pub fn run_just_finished(&self) -> bool {
        self.finished.is_some()
    }
}
