// src/exec/executor_loop.rs

//! Executor loop that hands scheduled tasks to the task runner.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskName};
use crate::exec::backend::TaskEnv;
use crate::exec::task_runner::run_task;

/// Spawn the background executor loop.
///
/// The returned sender is what `RealExecutorBackend` forwards scheduled
/// tasks to. Each task runs in its own Tokio task, so the transforms of one
/// run proceed concurrently.
pub fn spawn_executor(
    env: TaskEnv,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        // Latest handle per task name, for diagnostics only.
        let mut active: HashMap<TaskName, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            if let Some(previous) = active.get(&task.name) {
                if !previous.is_finished() {
                    // The scheduler never dispatches a task twice within one
                    // run, so this is a task from an older run still writing.
                    warn!(
                        task = %task.name,
                        run_id = task.run_id,
                        "previous instance still running; starting new instance anyway"
                    );
                }
            }

            let name = task.name.clone();
            let handle = tokio::spawn(run_task(task, env.clone(), runtime_tx.clone()));
            active.insert(name, handle);
            active.retain(|_, handle| !handle.is_finished());
        }

        debug!(pending = active.len(), "executor loop finished (channel closed)");
    });

    tx
}
