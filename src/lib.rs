// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod types;
pub mod watch;

use std::future::Future;
use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{resolve_config, BuildContext};
use crate::dag::{RunReport, Scheduler};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::SitepipeError;
use crate::exec::{RealExecutorBackend, TaskEnv};
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::catalog::{task_catalog, TaskDef};
use crate::server::{DevServer, ReloadHub};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and mode/path resolution
/// - scheduler / queue / runtime
/// - executor
/// - (dev only) dev server and file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let (settings, project_root) = resolve_config(args.config.as_deref())?;
    let ctx = BuildContext::from_env(settings, &project_root);
    let defs = task_catalog(&ctx.settings.tasks.disabled);
    let command = args.command();

    info!(
        mode = %ctx.mode,
        source = ?ctx.paths.source_root,
        output = ?ctx.paths.output_root,
        "resolved build environment"
    );

    if args.dry_run {
        print_dry_run(command, &ctx, &defs);
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    match command {
        Command::Build => build(Arc::new(ctx), fs, &defs).await,
        Command::Dev => {
            let listener = DevServer::bind(&ctx.settings.server).await?;
            dev(Arc::new(ctx), fs, &defs, listener, ctrl_c()).await
        }
    }
}

/// Clean, run every transform once, and fail when any task failed.
pub async fn build(ctx: Arc<BuildContext>, fs: Arc<dyn FileSystem>, defs: &[TaskDef]) -> Result<()> {
    let env = TaskEnv {
        ctx,
        fs,
        reload: None,
    };
    let mut pipeline = Orchestrator::start(env, defs, true).await?;
    forward_ctrl_c(pipeline.events.clone());

    pipeline.runtime.await??;

    let mut last = None;
    while let Ok(report) = pipeline.reports.try_recv() {
        last = Some(report);
    }

    match last {
        Some(report) if report.is_success() => {
            info!(tasks = report.succeeded.len(), "build finished");
            Ok(())
        }
        Some(report) => Err(SitepipeError::BuildFailed(report.failed).into()),
        None => bail!("build interrupted before all tasks finished"),
    }
}

/// Build, then serve the output root on `listener` and rebuild on source
/// changes until `shutdown` resolves.
pub async fn dev(
    ctx: Arc<BuildContext>,
    fs: Arc<dyn FileSystem>,
    defs: &[TaskDef],
    listener: TcpListener,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let hub = ReloadHub::new();
    let env = TaskEnv {
        ctx: Arc::clone(&ctx),
        fs: Arc::clone(&fs),
        reload: Some(hub.clone()),
    };
    let mut pipeline = Orchestrator::start(env, defs, false).await?;

    tokio::pin!(shutdown);

    let first = tokio::select! {
        report = pipeline.reports.recv() => report,
        _ = &mut shutdown => {
            info!("interrupted during initial build");
            return pipeline.stop().await;
        }
    };
    match first {
        Some(report) if report.is_success() => info!("initial build finished"),
        Some(report) => warn!(failed = ?report.failed, "initial build failed; watching for changes"),
        None => bail!("runtime stopped before the initial build finished"),
    }

    let server = DevServer::serve(listener, &ctx.paths.output_root, hub)?;
    let profiles = watch::build_task_watch_profiles(defs, ctx.settings.watch.use_hash)?;
    let _watcher = watch::spawn_watcher(&ctx.paths.source_root, profiles, fs, pipeline.events.clone())?;

    info!(
        url = %format!("http://{}", server.local_addr()),
        "watching {:?}",
        ctx.paths.source_root
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
            report = pipeline.reports.recv() => {
                if report.is_none() {
                    warn!("runtime stopped unexpectedly");
                    break;
                }
            }
        }
    }

    server.shutdown().await?;
    pipeline.stop().await
}

/// Resolves on Ctrl-C, or never when the signal cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received");
}

/// A running runtime plus the channels `build` and `dev` talk to it through.
struct Orchestrator {
    events: mpsc::Sender<RuntimeEvent>,
    reports: mpsc::UnboundedReceiver<RunReport>,
    runtime: JoinHandle<errors::Result<()>>,
}

impl Orchestrator {
    /// Spawn the runtime and trigger the graph roots.
    async fn start(env: TaskEnv, defs: &[TaskDef], exit_when_idle: bool) -> Result<Self> {
        let scheduler = Scheduler::from_defs(defs);
        let roots = scheduler.graph().roots();

        let watch = &env.ctx.settings.watch;
        let core = CoreRuntime::new(
            scheduler,
            watch.triggered_while_running_behaviour,
            watch.queue_length,
            RuntimeOptions { exit_when_idle },
        );

        let (events, event_rx) = mpsc::channel::<RuntimeEvent>(64);
        let (report_tx, reports) = mpsc::unbounded_channel();

        let executor = RealExecutorBackend::new(env, events.clone());
        let runtime = tokio::spawn(Runtime::new(core, event_rx, executor).with_reports(report_tx).run());

        debug!(?roots, "triggering task graph roots");
        for task in roots {
            events
                .send(RuntimeEvent::TaskTriggered {
                    task,
                    reason: TriggerReason::Manual,
                })
                .await?;
        }

        Ok(Self {
            events,
            reports,
            runtime,
        })
    }

    async fn stop(self) -> Result<()> {
        // The runtime may already have exited and dropped its receiver.
        let _ = self.events.send(RuntimeEvent::ShutdownRequested).await;
        self.runtime.await??;
        Ok(())
    }
}

fn forward_ctrl_c(tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            return;
        }
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    });
}

/// Print the resolved mode, paths and task graph.
fn print_dry_run(command: Command, ctx: &BuildContext, defs: &[TaskDef]) {
    let watch = &ctx.settings.watch;

    println!("sitepipe dry-run ({})", command_name(command));
    println!("  mode = {}", ctx.mode);
    println!("  source root = {}", ctx.paths.source_root.display());
    println!("  output root = {}", ctx.paths.output_root.display());
    if command == Command::Dev {
        println!("  server = {}:{}", ctx.settings.server.host, ctx.settings.server.port);
        println!(
            "  watch.triggered_while_running_behaviour = {:?}",
            watch.triggered_while_running_behaviour
        );
        println!("  watch.queue_length = {}", watch.queue_length);
        println!("  watch.use_hash = {}", watch.use_hash);
    }
    println!();

    println!("tasks ({}):", defs.len());
    for def in defs {
        println!("  - {}", def.name);
        if !def.after.is_empty() {
            println!("      after: {:?}", def.after);
        }
        if let Some(glob) = &def.watch {
            println!("      watch: {glob}");
        }
    }
    if !ctx.settings.tasks.disabled.is_empty() {
        println!("disabled: {:?}", ctx.settings.tasks.disabled);
    }

    debug!("dry-run complete (no execution)");
}

fn command_name(command: Command) -> &'static str {
    match command {
        Command::Build => "build",
        Command::Dev => "dev",
    }
}
