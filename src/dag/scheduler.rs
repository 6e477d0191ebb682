// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::registry::ExecutionPlan;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{deps_satisfied, StateManager};
use crate::dag::task_info::{RunState, TaskInfo};
use crate::engine::{TaskName, TaskOutcome};

/// Per-run state machine over one execution plan.
///
/// The scheduler never runs anything itself. The executor asks it which
/// tasks may start, reports completions back, and gets the next batch:
/// - a task starts once all its dependencies succeeded
/// - a failed task fails every dependent that has not started
/// - the run is finished once every task is terminal
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    run_id: u64,
    finished: bool,
}

impl Scheduler {
    pub fn new(plan: &ExecutionPlan, run_id: u64) -> Self {
        let graph = DagGraph::from_plan(plan);
        let tasks = plan
            .tasks
            .values()
            .map(|task| (task.name.clone(), TaskInfo::from_task(task)))
            .collect();

        debug!(run_id, tasks = plan.len(), "scheduler: new run");

        Self {
            graph,
            tasks,
            run_id,
            finished: plan.is_empty(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn run_state_of(&self, task: &str) -> Option<RunState> {
        self.tasks.get(task).map(|info| info.run_state)
    }

    /// Whether every dependency of `task` has succeeded in this run.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        Some(deps_satisfied(&self.tasks, info))
    }

    /// Schedule the tasks that have no unfinished dependencies.
    pub fn start(&mut self) -> SchedulerStep {
        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.run_id);
        let newly_scheduled = manager.collect_new_ready_tasks();
        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished: self.maybe_finish_run(),
        }
    }

    /// Record the outcome of a running task.
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        let Some(info) = self.tasks.get_mut(task) else {
            warn!(task = %task, "completion for task outside this run; ignoring");
            return step;
        };
        if info.run_state != RunState::Running {
            warn!(task = %task, state = ?info.run_state, "completion for task that is not running; ignoring");
            return step;
        }

        match outcome {
            TaskOutcome::Success => {
                info.run_state = RunState::DoneSuccess;
                debug!(task = %task, run_id = self.run_id, "task succeeded");
                let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.run_id);
                step.newly_scheduled = manager.collect_new_ready_tasks();
            }
            TaskOutcome::Failed => {
                info.run_state = RunState::DoneFailed;
                warn!(task = %task, run_id = self.run_id, "task failed; failing its dependents");
                step.newly_failed.push(task.to_string());
                let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.run_id);
                step.newly_failed.extend(manager.mark_dependents_failed(task));
                // Independent branches keep going.
                step.newly_scheduled = manager.collect_new_ready_tasks();
            }
        }

        step.run_just_finished = self.maybe_finish_run();
        step
    }

    fn maybe_finish_run(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let manager = StateManager::new(&self.graph, &mut self.tasks, self.run_id);
        if manager.all_tasks_terminal() {
            info!(run_id = self.run_id, "scheduler: all tasks terminal");
            self.finished = true;
            true
        } else {
            false
        }
    }
}
