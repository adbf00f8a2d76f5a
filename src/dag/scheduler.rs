// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{RunState, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};
use crate::pipeline::catalog::TaskDef;

/// Scheduler holds the immutable DAG plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current run
/// - deciding when a triggered task is "ready" to run (deps satisfied)
/// - marking tasks as succeeded/failed
/// - scheduling dependents when appropriate
/// - failing dependents when a task fails
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    /// Construct a scheduler from validated task definitions.
    pub fn from_defs(defs: &[TaskDef]) -> Self {
        let graph = DagGraph::from_defs(defs);

        let tasks = defs
            .iter()
            .map(|def| {
                let deps = graph.dependencies_of(&def.name).to_vec();
                (def.name.clone(), TaskInfo::from_def(def, deps))
            })
            .collect();

        Self {
            graph,
            tasks,
            run_counter: 0,
            current_run_id: None,
        }
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Current run ID, if any.
    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.run_state.into())
    }

    /// Whether the dependencies of `task` are satisfied for the *current run*.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        let mgr = ReadOnlyStateManager::new(&self.tasks);
        Some(mgr.deps_satisfied_for_info(info))
    }

    /// Start a new run, resetting per-run state but keeping historical success
    /// information (for dependency satisfaction on later runs).
    pub fn start_new_run(&mut self) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for info in self.tasks.values_mut() {
            info.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new DAG run");
    }

    /// Include `task` and its dependents in the current run.
    pub fn step_trigger(&mut self, task: &str) -> SchedulerStep {
        self.trigger_step_internal(task)
    }

    /// Record the outcome of a running task.
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        self.completion_step_internal(task, outcome)
    }

    /// Task names in definition order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.tasks()
    }

    /// Finish the run if every task is terminal, returning its report.
    fn maybe_finish_run(&mut self) -> SchedulerStep {
        let Some(run_id) = self.current_run_id else {
            return SchedulerStep::default();
        };

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        if !manager.all_tasks_terminal() {
            return SchedulerStep::default();
        }

        let report = manager.report(run_id);
        info!(
            run_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "scheduler: all tasks terminal; run finished"
        );
        self.current_run_id = None;

        SchedulerStep {
            finished: Some(report),
            ..SchedulerStep::default()
        }
    }

    fn trigger_step_internal(&mut self, task: &str) -> SchedulerStep {
        if self.current_run_id.is_none() {
            warn!(
                task = %task,
                "trigger with no active run; implicitly starting a new run"
            );
            self.start_new_run();
        }

        let known = self.tasks.contains_key(task);
        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);

        if known {
            // A dependency that never succeeded (e.g. a failed clean) would
            // leave the task pending forever; rerun from there instead.
            let stale = manager.stale_ancestors(task);
            if stale.is_empty() {
                manager.mark_task_and_dependents_pending(task);
            } else {
                info!(task = %task, ?stale, "upstream tasks never succeeded; including them in this run");
                for ancestor in &stale {
                    manager.mark_task_and_dependents_pending(ancestor);
                }
            }
        } else {
            warn!(task = %task, "trigger for unknown task; ignoring");
        }

        let newly_scheduled = manager.collect_new_ready_tasks();
        let finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            ..finished
        }
    }

    fn completion_step_internal(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let Some(run_id) = self.current_run_id else {
            warn!(task = %task, "completion with no active run; ignoring");
            return SchedulerStep::default();
        };

        let mut newly_scheduled = Vec::new();
        let mut newly_failed = Vec::new();

        match self.tasks.get_mut(task) {
            Some(info) if info.run_state == Some(RunState::Running) => match outcome {
                TaskOutcome::Success => {
                    info.run_state = Some(RunState::DoneSuccess);
                    info.last_successful_run = Some(run_id);
                    debug!(task = %info.name, run_id, "task completed successfully");

                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    newly_scheduled.extend(manager.collect_new_ready_tasks());
                }
                TaskOutcome::Failed => {
                    info.run_state = Some(RunState::DoneFailed);
                    info.last_failed_run = Some(run_id);
                    warn!(task = %info.name, run_id, "task failed; failing dependents in this run");
                    newly_failed.push(info.name.clone());

                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    newly_failed.append(&mut manager.mark_dependents_failed(task));
                }
            },
            Some(info) => {
                warn!(
                    task = %task,
                    state = ?info.run_state,
                    "completion for a task that is not running in this run; ignoring"
                );
            }
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
            }
        }

        let finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            ..finished
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::task_info::ScheduledTask;
    use crate::pipeline::catalog::task_catalog;

    fn names(tasks: &[ScheduledTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
    }

    fn scheduler() -> Scheduler {
        Scheduler::from_defs(&task_catalog(&["fonts".into(), "metadata".into(), "images".into()]))
    }

    #[test]
    fn clean_runs_before_every_transform() {
        let mut s = scheduler();
        s.start_new_run();

        let step = s.step_trigger("clean");
        assert_eq!(names(&step.newly_scheduled), vec!["clean"]);
        assert_eq!(s.deps_satisfied("styles"), Some(false));

        let step = s.step_completion("clean", TaskOutcome::Success);
        assert_eq!(names(&step.newly_scheduled), vec!["scripts", "styles", "views"]);
        assert!(!step.run_just_finished());

        s.step_completion("views", TaskOutcome::Success);
        s.step_completion("styles", TaskOutcome::Failed);
        let step = s.step_completion("scripts", TaskOutcome::Success);

        let report = step.finished.expect("run finished");
        assert_eq!(report.run_id, 1);
        assert_eq!(report.succeeded, vec!["clean", "scripts", "views"]);
        assert_eq!(report.failed, vec!["styles"]);
        assert!(s.is_idle());
    }

    #[test]
    fn failed_clean_fails_every_dependent() {
        let mut s = scheduler();
        s.start_new_run();
        s.step_trigger("clean");

        let step = s.step_completion("clean", TaskOutcome::Failed);
        let mut failed = step.newly_failed.clone();
        failed.sort();
        assert_eq!(failed, vec!["clean", "scripts", "styles", "views"]);
        assert!(step.newly_scheduled.is_empty());

        let report = step.finished.expect("run finished");
        assert!(!report.is_success());
        assert!(report.succeeded.is_empty());
    }

    #[test]
    fn retrigger_after_successful_build_runs_only_that_task() {
        let mut s = scheduler();
        s.start_new_run();
        s.step_trigger("clean");
        s.step_completion("clean", TaskOutcome::Success);
        for task in ["scripts", "styles", "views"] {
            s.step_completion(task, TaskOutcome::Success);
        }
        assert!(s.is_idle());

        s.start_new_run();
        let step = s.step_trigger("styles");
        assert_eq!(names(&step.newly_scheduled), vec!["styles"]);
        assert_eq!(s.run_state_of("clean"), Some(TaskRunState::NotInRun));

        let step = s.step_completion("styles", TaskOutcome::Success);
        assert_eq!(step.finished.map(|r| r.succeeded), Some(vec!["styles".to_string()]));
    }

    #[test]
    fn retrigger_after_failed_clean_reruns_from_clean() {
        let mut s = scheduler();
        s.start_new_run();
        s.step_trigger("clean");
        s.step_completion("clean", TaskOutcome::Failed);
        assert!(s.is_idle());

        s.start_new_run();
        let step = s.step_trigger("styles");
        assert_eq!(names(&step.newly_scheduled), vec!["clean"]);
        assert_eq!(s.run_state_of("views"), Some(TaskRunState::Pending));
    }

    #[test]
    fn completion_for_task_not_running_is_ignored() {
        let mut s = scheduler();
        s.start_new_run();
        s.step_trigger("clean");

        let step = s.step_completion("views", TaskOutcome::Success);
        assert!(step.newly_scheduled.is_empty());
        assert_eq!(s.run_state_of("views"), Some(TaskRunState::Pending));
        assert!(!s.is_idle());
    }

    #[test]
    fn unknown_trigger_is_ignored() {
        let mut s = scheduler();
        s.start_new_run();
        let step = s.step_trigger("fonts");
        assert!(step.newly_scheduled.is_empty());
        assert!(step.run_just_finished());
    }
}
