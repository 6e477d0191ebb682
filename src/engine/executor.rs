// src/engine/executor.rs

//! Runs an execution plan: dependencies first, independent tasks
//! concurrently, every task at most once per run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::{ScheduledTask, Scheduler, TaskRegistry};
use crate::engine::{TaskContext, TaskName, TaskOutcome};
use crate::errors::{BuildError, Result};

/// What happened during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: u64,
    /// Tasks that completed successfully, in completion order.
    pub succeeded: Vec<TaskName>,
    pub failed: Vec<TaskName>,
    /// Tasks never started because a dependency failed.
    pub skipped: Vec<TaskName>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
struct TaskCompletion {
    task: TaskName,
    result: Result<()>,
    elapsed: Duration,
}

/// Executes tasks from a shared registry.
///
/// Every call to [`run`](Self::run) / [`run_all`](Self::run_all) resolves
/// its own plan, so unknown tasks and cycles are reported before any action
/// starts.
#[derive(Debug)]
pub struct Executor {
    registry: Arc<TaskRegistry>,
    ctx: TaskContext,
    run_counter: AtomicU64,
}

impl Executor {
    pub fn new(registry: Arc<TaskRegistry>, ctx: TaskContext) -> Self {
        Self {
            registry,
            ctx,
            run_counter: AtomicU64::new(0),
        }
    }

    /// Run `name` and everything it transitively depends on.
    pub async fn run(&self, name: &str) -> Result<RunSummary> {
        self.run_all(&[name]).await
    }

    /// Run several roots as a single run; shared dependencies execute once.
    ///
    /// On failure the first failing task is reported as
    /// [`BuildError::TaskFailed`]. Tasks that do not depend on it still run
    /// to completion before this returns.
    pub async fn run_all<S: AsRef<str>>(&self, names: &[S]) -> Result<RunSummary> {
        let plan = self.registry.resolve(names)?;
        let run_id = self.run_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let roots: Vec<&str> = names.iter().map(|n| n.as_ref()).collect();
        info!(run_id, ?roots, tasks = plan.len(), "starting run");

        let started = Instant::now();
        let mut scheduler = Scheduler::new(&plan, run_id);
        let mut summary = RunSummary {
            run_id,
            ..RunSummary::default()
        };
        let mut first_error: Option<BuildError> = None;

        let (tx, mut rx) = mpsc::unbounded_channel::<TaskCompletion>();
        let mut in_flight = self.dispatch(scheduler.start().newly_scheduled, &tx);

        while in_flight > 0 {
            let Some(done) = rx.recv().await else {
                break;
            };
            in_flight -= 1;

            let outcome = match done.result {
                Ok(()) => {
                    info!(task = %done.task, elapsed_ms = done.elapsed.as_millis() as u64, "finished task");
                    summary.succeeded.push(done.task.clone());
                    TaskOutcome::Success
                }
                Err(err) => {
                    error!(
                        task = %done.task,
                        elapsed_ms = done.elapsed.as_millis() as u64,
                        error = %err,
                        "task failed"
                    );
                    summary.failed.push(done.task.clone());
                    if first_error.is_none() {
                        first_error = Some(BuildError::TaskFailed {
                            task: done.task.clone(),
                            source: Box::new(err),
                        });
                    }
                    TaskOutcome::Failed
                }
            };

            let step = scheduler.step_completion(&done.task, outcome);
            summary.skipped.extend(
                step.newly_failed
                    .into_iter()
                    .filter(|name| name != &done.task),
            );
            in_flight += self.dispatch(step.newly_scheduled, &tx);
        }

        if !scheduler.is_finished() {
            warn!(run_id, "run ended with tasks still pending");
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match first_error {
            Some(err) => {
                error!(run_id, elapsed_ms, skipped = ?summary.skipped, "run failed");
                Err(err)
            }
            None => {
                info!(run_id, elapsed_ms, "run finished");
                Ok(summary)
            }
        }
    }

    /// Start every scheduled task; returns how many completions to expect.
    fn dispatch(
        &self,
        tasks: Vec<ScheduledTask>,
        tx: &mpsc::UnboundedSender<TaskCompletion>,
    ) -> usize {
        let count = tasks.len();
        for task in tasks {
            let tx = tx.clone();
            let Some(action) = task.action else {
                debug!(task = %task.name, "aggregate task; completes with its dependencies");
                let _ = tx.send(TaskCompletion {
                    task: task.name,
                    result: Ok(()),
                    elapsed: Duration::ZERO,
                });
                continue;
            };

            let ctx = self.ctx.clone();
            let name = task.name;
            tokio::spawn(async move {
                let started = Instant::now();
                // A nested task turns a panicking action into an ordinary
                // failure instead of losing the completion.
                let inner = tokio::spawn(async move { action.execute(ctx).await });
                let result = match inner.await {
                    Ok(result) => result,
                    Err(join_err) => Err(BuildError::Other(anyhow::anyhow!(
                        "task action aborted: {join_err}"
                    ))),
                };
                let _ = tx.send(TaskCompletion {
                    task: name,
                    result,
                    elapsed: started.elapsed(),
                });
            });
        }
        count
    }
}
