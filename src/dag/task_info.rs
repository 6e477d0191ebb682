// src/dag/task_info.rs

//! Per-run task state.

use std::sync::Arc;

use crate::dag::registry::{Task, TaskAction};
use crate::engine::TaskName;

/// Per-run state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting on dependencies.
    Pending,
    /// Handed to the executor.
    Running,
    DoneSuccess,
    /// Failed in this run, or blocked by a failed dependency.
    DoneFailed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::DoneSuccess | RunState::DoneFailed)
    }
}

#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    pub deps: Vec<TaskName>,
    pub action: Option<Arc<dyn TaskAction>>,
    pub run_state: RunState,
}

impl TaskInfo {
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            deps: task.deps.clone(),
            action: task.action.clone(),
            run_state: RunState::Pending,
        }
    }
}

/// A task the scheduler wants the executor to start now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub action: Option<Arc<dyn TaskAction>>,
    /// All tasks of the same run share this id.
    pub run_id: u64,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo, run_id: u64) -> Self {
        Self {
            name: info.name.clone(),
            action: info.action.clone(),
            run_id,
        }
    }
}
