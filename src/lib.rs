// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod devserver;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pattern;
pub mod pipeline;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{effective_env, load_or_default, BuildConfig, ENV_VAR};
use crate::dag::TaskRegistry;
use crate::devserver::ReloadHub;
use crate::engine::{CoreRuntime, Executor, Runtime, RuntimeEvent, Services, TaskContext};
use crate::tasks::{names, register_builtin_tasks, select_environment};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the environment selector
/// - task registration and graph validation
/// - one executor run over the requested tasks
/// - the trigger runtime while services (watcher, dev server) are up
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref().map(Path::new))?;
    let env = effective_env(args.env.as_deref(), std::env::var(ENV_VAR).ok(), &cfg.env);
    let cfg = Arc::new(cfg.with_env(env));
    info!(env = %cfg.env, root = ?cfg.root, "configuration loaded");

    let mut registry = TaskRegistry::new();
    register_builtin_tasks(&mut registry, Arc::clone(&cfg));
    registry.validate()?;

    let requested: Vec<String> = if args.tasks.is_empty() {
        vec![names::DEFAULT.to_string()]
    } else {
        args.tasks.clone()
    };

    if args.dry_run {
        print_dry_run(&cfg, &registry, &requested)?;
        return Ok(());
    }

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let services = Services::default();
    let ctx = TaskContext::new(services.clone(), ReloadHub::new(), Some(rt_tx.clone()));
    let executor = Arc::new(Executor::new(Arc::new(registry), ctx));

    if let Err(err) = executor.run_all(&requested).await {
        services.stop_all().await;
        return Err(err.into());
    }

    if services.is_empty() {
        return Ok(());
    }

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl-C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(services = services.len(), "watching for changes; press Ctrl-C to stop");
    let core = CoreRuntime::new(
        cfg.watch.triggered_while_running_behaviour,
        cfg.watch.queue_length,
    );
    let outcome = Runtime::new(core, rt_rx, rt_tx, executor).run().await;

    services.stop_all().await;
    outcome.map_err(Into::into)
}

/// Print configuration, the environment's task set and the plan for the
/// requested tasks without running anything.
fn print_dry_run(cfg: &BuildConfig, registry: &TaskRegistry, requested: &[String]) -> Result<()> {
    let plan = registry.resolve(requested)?;

    println!("sitedag dry-run");
    println!("  env = {}", cfg.env);
    println!("  root = {}", cfg.root.display());
    println!("  build dir = {}", cfg.build_path().display());
    println!(
        "  watch.triggered_while_running_behaviour = {:?}",
        cfg.watch.triggered_while_running_behaviour
    );
    println!("  watch.queue_length = {}", cfg.watch.queue_length);
    println!("  default = {:?}", select_environment(&cfg.env).tasks());
    println!();

    println!("tasks ({}):", registry.len());
    for task in registry.tasks() {
        let kind = if task.action.is_some() { "" } else { " (group)" };
        println!("  - {}{kind}", task.name);
        if !task.deps.is_empty() {
            println!("      after: {:?}", task.deps);
        }
    }
    println!();

    println!("plan for {requested:?}:");
    for (idx, name) in plan.order.iter().enumerate() {
        println!("  {}. {name}", idx + 1);
    }
    Ok(())
}
