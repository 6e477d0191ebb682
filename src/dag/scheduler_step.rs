// src/dag/scheduler_step.rs

use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// What changed in one scheduler step.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks whose dependencies are now all satisfied.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// The failed task itself plus every dependent it blocked.
    pub newly_failed: Vec<TaskName>,
    /// Every task of the run is now terminal.
    pub run_just_finished: bool,
}
