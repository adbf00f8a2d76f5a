// src/engine/queue.rs

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::engine::TaskName;
use crate::types::TriggerWhileRunningBehaviour;

/// Queue of triggers that arrive for tasks already part of the active run.
///
/// Semantics:
/// - Each queued entry represents a *batch* of task names that should be
///   treated as triggers for a future DAG run.
/// - `max_runs` (`[watch] queue_length`) defines how many such batches to
///   keep. The default is 1, meaning "at most one future run is queued".
/// - When the runtime is idle and wants to start a new run, it calls
///   `drain_pending()`, which merges all queued batches into a single set of
///   task names for that run.
///
/// Saving the same stylesheet three times while `styles` is running
/// therefore results in exactly one follow-up run of `styles`.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    max_runs: usize,
    /// Each entry is a set of tasks that should be triggered together as one
    /// "batch" when the current DAG run completes.
    runs: VecDeque<HashSet<TaskName>>,
}

impl TriggerQueue {
    /// Create a new queue with the given behaviour and maximum queued runs.
    ///
    /// `max_runs` is clamped to at least 1.
    pub fn new(behaviour: TriggerWhileRunningBehaviour, max_runs: usize) -> Self {
        Self {
            behaviour,
            max_runs: max_runs.max(1),
            runs: VecDeque::new(),
        }
    }

    /// Returns true if there are no queued triggers.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Returns the configured behaviour.
    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    /// Record that a task was triggered while it is part of the active run.
    ///
    /// - `Queue`: merge into the last queued batch (creating one if needed);
    ///   if the number of batches exceeds `max_runs`, drop the oldest.
    /// - `Cancel`: drop every queued batch and keep a single batch with only
    ///   this task. The running tasks themselves are never interrupted.
    pub fn record_trigger(&mut self, task: &str) {
        let name = task.to_string();

        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                if let Some(last_batch) = self.runs.back_mut() {
                    let inserted = last_batch.insert(name.clone());
                    debug!(task = %name, inserted, "merged trigger into last queued batch");
                } else {
                    self.runs.push_back(HashSet::from([name.clone()]));
                    debug!(task = %name, "created first queued batch");
                }

                if self.runs.len() > self.max_runs {
                    warn!(
                        current_batches = self.runs.len(),
                        max_runs = self.max_runs,
                        "exceeded queue_length; dropping oldest queued batches"
                    );
                    while self.runs.len() > self.max_runs {
                        self.runs.pop_front();
                    }
                }
            }
            TriggerWhileRunningBehaviour::Cancel => {
                debug!(task = %name, "resetting queued batches to this task only");
                self.runs.clear();
                self.runs.push_back(HashSet::from([name]));
            }
        }
    }

    /// Drain all queued batches and merge them into one sorted list of task
    /// names.
    pub fn drain_pending(&mut self) -> Vec<TaskName> {
        let mut merged: HashSet<TaskName> = HashSet::new();

        while let Some(batch) = self.runs.pop_front() {
            merged.extend(batch);
        }

        let mut tasks: Vec<TaskName> = merged.into_iter().collect();
        tasks.sort();
        debug!(drained = tasks.len(), "drained queued triggers into new run");
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_mode_coalesces_repeated_triggers() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 1);
        q.record_trigger("styles");
        q.record_trigger("styles");
        q.record_trigger("views");

        assert_eq!(q.drain_pending(), vec!["styles", "views"]);
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_mode_keeps_only_latest_trigger() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Cancel, 3);
        q.record_trigger("styles");
        q.record_trigger("scripts");

        assert_eq!(q.behaviour(), TriggerWhileRunningBehaviour::Cancel);
        assert_eq!(q.drain_pending(), vec!["scripts"]);
    }

    #[test]
    fn zero_length_is_clamped() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 0);
        q.record_trigger("images");
        assert_eq!(q.drain_pending(), vec!["images"]);
    }
}
