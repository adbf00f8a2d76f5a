// src/exec/task_runner.rs

//! Runs one scheduled task and reports its outcome.

use std::time::Instant;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::{Result, SitepipeError};
use crate::exec::backend::TaskEnv;
use crate::pipeline;
use crate::types::ReloadNotice;

/// Run the task body on the blocking pool, publish a reload notice on
/// success, and always answer the runtime with `TaskCompleted`.
pub async fn run_task(task: ScheduledTask, env: TaskEnv, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    let started = Instant::now();
    info!(task = %task.name, run_id = task.run_id, "starting task");

    let outcome = match execute(&task, &env).await {
        Ok(notice) => {
            info!(
                task = %task.name,
                run_id = task.run_id,
                elapsed = ?started.elapsed(),
                "task finished"
            );
            if let (Some(hub), Some(notice)) = (&env.reload, notice) {
                hub.publish(notice);
            }
            TaskOutcome::Success
        }
        Err(err) => {
            error!(task = %task.name, run_id = task.run_id, error = %err, "task failed");
            TaskOutcome::Failed
        }
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            outcome,
        })
        .await
        .is_err()
    {
        error!(task = %task.name, "runtime channel closed; dropping completion");
    }
}

async fn execute(task: &ScheduledTask, env: &TaskEnv) -> Result<Option<ReloadNotice>> {
    let name = task.name.clone();
    let kind = task.kind;
    let ctx = env.ctx.clone();
    let fs = env.fs.clone();

    tokio::task::spawn_blocking(move || pipeline::run_task(&name, kind, &ctx, fs.as_ref()))
        .await
        .with_context(|| format!("task '{}' panicked or was cancelled", task.name))
        .map_err(SitepipeError::from)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use crate::config::{BuildContext, ConfigFile};
    use crate::fs::mock::MockFileSystem;
    use crate::pipeline::{AssetKind, TaskKind};
    use crate::server::ReloadHub;
    use crate::types::{BuildMode, ReloadKind};

    fn env(fs: &MockFileSystem, reload: Option<ReloadHub>) -> TaskEnv {
        TaskEnv {
            ctx: Arc::new(BuildContext::new(
                BuildMode::Development,
                ConfigFile::default(),
                Path::new("/site"),
            )),
            fs: Arc::new(fs.clone()),
            reload,
        }
    }

    fn scheduled(kind: TaskKind, name: &str) -> ScheduledTask {
        ScheduledTask {
            name: name.to_string(),
            kind,
            run_id: 1,
        }
    }

    #[tokio::test]
    async fn success_publishes_reload_and_completes() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/src/fonts/a.woff2", "font");
        let hub = ReloadHub::new();
        let mut notices = hub.subscribe();
        let (tx, mut rx) = mpsc::channel(4);

        run_task(
            scheduled(TaskKind::Asset(AssetKind::Fonts), "fonts"),
            env(&fs, Some(hub)),
            tx,
        )
        .await;

        match rx.recv().await {
            Some(RuntimeEvent::TaskCompleted { task, outcome }) => {
                assert_eq!(task, "fonts");
                assert_eq!(outcome, TaskOutcome::Success);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.kind, ReloadKind::Full);
        assert_eq!(notice.paths, vec!["assets/fonts/a.woff2".to_string()]);
        assert_eq!(fs.contents("/site/dist/assets/fonts/a.woff2"), Some(b"font".to_vec()));
    }

    #[tokio::test]
    async fn failure_is_reported_as_failed_outcome() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/dist/index.html", "old");
        fs.lock_dir("/site/dist");
        let (tx, mut rx) = mpsc::channel(4);

        run_task(scheduled(TaskKind::Clean, "clean"), env(&fs, None), tx).await;

        assert!(matches!(
            rx.recv().await,
            Some(RuntimeEvent::TaskCompleted { outcome: TaskOutcome::Failed, .. })
        ));
    }
}
