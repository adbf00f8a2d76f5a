// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::HashSet;

use crate::dag::{RunReport, ScheduledTask, Scheduler, SchedulerStep, TaskRunState};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// A DAG run reached a terminal state.
    ReportRunFinished(RunReport),
    /// Request that the process exits (used by `build` once idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a task trigger event.
///
/// - If the scheduler is idle, we start a new run and seed it with
///   this trigger plus anything that was already queued.
/// - If a run is active:
///   - If `task` is already participating in this run, we honour the
///     queue/cancel semantics and record it for a *future* run.
///   - If `task` is *not* in the current run, we merge it into the
///     current run immediately, so it shares the run_id and runs in
///     parallel with what is already running.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    tracing::debug!(task = %task, ?reason, "handling trigger");

    if scheduler.is_idle() {
        let mut triggers: HashSet<TaskName> = queue.drain_pending().into_iter().collect();
        triggers.insert(task);

        let mut triggers: Vec<TaskName> = triggers.into_iter().collect();
        triggers.sort();
        return start_new_run_from_triggers(scheduler, triggers);
    }

    let mut commands = Vec::new();
    match scheduler.run_state_of(&task) {
        None => {
            tracing::warn!(task = %task, "trigger for unknown task; ignoring");
        }
        Some(TaskRunState::NotInRun) => {
            let step = scheduler.step_trigger(&task);
            push_step(&mut commands, step);
        }
        Some(_already_in_run) => {
            queue.record_trigger(&task);
        }
    }

    CoreStep::continue_with(commands)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    let step = scheduler.step_completion(&task, outcome);
    push_step(&mut commands, step);

    commands.extend(maybe_start_queued_run(scheduler, queue));

    // `build` exits once the DAG is idle and nothing is queued.
    let mut keep_running = true;
    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

/// Start a new run seeded with the given triggers.
pub fn start_new_run_from_triggers(
    scheduler: &mut Scheduler,
    triggers: Vec<TaskName>,
) -> CoreStep {
    let mut commands = Vec::new();

    if triggers.is_empty() {
        return CoreStep::continue_with(commands);
    }

    scheduler.start_new_run();

    let mut all_ready = Vec::new();
    let mut finished = None;
    for task in triggers {
        let step = scheduler.step_trigger(&task);
        all_ready.extend(step.newly_scheduled);
        finished = finished.or(step.finished);
    }

    if !all_ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(all_ready));
    }
    if let Some(report) = finished {
        commands.push(CoreCommand::ReportRunFinished(report));
    }

    CoreStep::continue_with(commands)
}

fn push_step(commands: &mut Vec<CoreCommand>, step: SchedulerStep) {
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }
    if let Some(report) = step.finished {
        commands.push(CoreCommand::ReportRunFinished(report));
    }
}

/// If the scheduler is idle and there are queued triggers, start a new run.
fn maybe_start_queued_run(scheduler: &mut Scheduler, queue: &mut TriggerQueue) -> Vec<CoreCommand> {
    if !scheduler.is_idle() {
        return Vec::new();
    }

    let triggers = queue.drain_pending();
    if triggers.is_empty() {
        return Vec::new();
    }

    start_new_run_from_triggers(scheduler, triggers).commands
}
