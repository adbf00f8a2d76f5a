// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - forwarding run reports
//! - handling Ctrl+C / shutdown
//!
//! The core is unit tested without any Tokio, channels or filesystem.

use crate::dag::Scheduler;
use crate::engine::event_handlers::{handle_task_completion, handle_task_trigger, CoreStep};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::types::TriggerWhileRunningBehaviour;

/// Pure core runtime state.
///
/// This owns:
/// - the DAG scheduler
/// - the trigger queue
/// - runtime options (e.g. `exit_when_idle`)
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    queue: TriggerQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(
        scheduler: Scheduler,
        behaviour: TriggerWhileRunningBehaviour,
        queue_length: usize,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            scheduler,
            queue: TriggerQueue::new(behaviour, queue_length),
            options,
        }
    }

    /// Expose whether the scheduler is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Expose queue emptiness (for tests).
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_trigger(&mut self.scheduler, &mut self.queue, task, reason)
            }
            RuntimeEvent::TaskCompleted { task, outcome } => handle_task_completion(
                &mut self.scheduler,
                &mut self.queue,
                &self.options,
                task,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::{ScheduledTask, TaskRunState};
    use crate::engine::event_handlers::CoreCommand;
    use crate::engine::{TaskOutcome, TriggerReason};
    use crate::pipeline::catalog::task_catalog;

    fn core(exit_when_idle: bool) -> CoreRuntime {
        let defs = task_catalog(&["images".into(), "fonts".into(), "metadata".into()]);
        CoreRuntime::new(
            Scheduler::from_defs(&defs),
            TriggerWhileRunningBehaviour::Queue,
            1,
            RuntimeOptions { exit_when_idle },
        )
    }

    fn trigger(task: &str, reason: TriggerReason) -> RuntimeEvent {
        RuntimeEvent::TaskTriggered {
            task: task.to_string(),
            reason,
        }
    }

    fn done(task: &str, outcome: TaskOutcome) -> RuntimeEvent {
        RuntimeEvent::TaskCompleted {
            task: task.to_string(),
            outcome,
        }
    }

    fn dispatched(step: &CoreStep) -> Vec<String> {
        step.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::DispatchTasks(tasks) => Some(tasks.clone()),
                _ => None,
            })
            .flatten()
            .map(|t: ScheduledTask| t.name)
            .collect()
    }

    #[test]
    fn build_runs_clean_then_transforms_then_exits() {
        let mut core = core(true);

        let step = core.step(trigger("clean", TriggerReason::Manual));
        assert_eq!(dispatched(&step), vec!["clean"]);

        let step = core.step(done("clean", TaskOutcome::Success));
        assert_eq!(dispatched(&step), vec!["scripts", "styles", "views"]);
        assert!(step.keep_running);

        core.step(done("scripts", TaskOutcome::Success));
        core.step(done("views", TaskOutcome::Failed));
        let step = core.step(done("styles", TaskOutcome::Success));

        assert!(!step.keep_running);
        assert!(matches!(
            step.commands.as_slice(),
            [CoreCommand::ReportRunFinished(report), CoreCommand::RequestExit]
                if report.failed == vec!["views".to_string()]
        ));
    }

    #[test]
    fn retrigger_while_running_is_queued_for_next_run() {
        let mut core = core(false);
        core.step(trigger("clean", TriggerReason::Manual));
        core.step(done("clean", TaskOutcome::Success));

        let step = core.step(trigger("styles", TriggerReason::FileWatch));
        assert!(step.commands.is_empty());
        assert!(!core.queue_is_empty());
        assert_eq!(core.scheduler().run_state_of("styles"), Some(TaskRunState::Running));

        core.step(done("views", TaskOutcome::Success));
        core.step(done("scripts", TaskOutcome::Success));
        let step = core.step(done("styles", TaskOutcome::Success));

        assert!(step.keep_running);
        assert!(matches!(step.commands[0], CoreCommand::ReportRunFinished(ref r) if r.run_id == 1));
        assert_eq!(dispatched(&step), vec!["styles"]);
        assert_eq!(core.scheduler().current_run_id(), Some(2));
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut core = core(false);
        assert!(!core.step(RuntimeEvent::ShutdownRequested).keep_running);
    }
}
