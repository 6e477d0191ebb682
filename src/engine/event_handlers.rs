// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::engine::queue::TriggerQueue;
use crate::engine::{TaskName, TriggerReason};

/// Command produced by the pure core, executed by the async shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Hand these roots to the executor as one run.
    StartRun(Vec<TaskName>),
    /// Stop the runtime loop.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}

impl CoreStep {
    fn keep(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a trigger.
///
/// - Idle: start a run seeded with this trigger plus anything queued.
/// - Busy: remember it for the next run (queue or cancel semantics).
pub fn handle_task_trigger(
    running: &mut Option<Vec<TaskName>>,
    queue: &mut TriggerQueue,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    if running.is_some() {
        debug!(task = %task, ?reason, "run in progress; queueing trigger");
        queue.record_trigger(&task);
        return CoreStep::keep(Vec::new());
    }

    let mut roots: BTreeSet<TaskName> = queue.drain_pending().into_iter().collect();
    roots.insert(task);
    CoreStep::keep(start_run(running, roots.into_iter().collect()))
}

/// Handle the end of a run: start the queued follow-up, if any.
pub fn handle_run_finished(
    running: &mut Option<Vec<TaskName>>,
    queue: &mut TriggerQueue,
    tasks: Vec<TaskName>,
    success: bool,
) -> CoreStep {
    if running.take().is_none() {
        debug!(?tasks, "run finished while core was idle; ignoring");
    }
    info!(?tasks, success, "run finished");

    let queued = queue.drain_pending();
    if queued.is_empty() {
        return CoreStep::keep(Vec::new());
    }
    CoreStep::keep(start_run(running, queued))
}

fn start_run(running: &mut Option<Vec<TaskName>>, roots: Vec<TaskName>) -> Vec<CoreCommand> {
    if roots.is_empty() {
        return Vec::new();
    }
    *running = Some(roots.clone());
    vec![CoreCommand::StartRun(roots)]
}
