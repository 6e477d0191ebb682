// src/dag/state_manager.rs

//! State transitions for the tasks of one run.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::dag::DagGraph;
use crate::engine::TaskName;

pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
    run_id: u64,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DagGraph,
        tasks: &'a mut HashMap<TaskName, TaskInfo>,
        run_id: u64,
    ) -> Self {
        Self {
            graph,
            tasks,
            run_id,
        }
    }

    /// Mark every transitive dependent of `failed_task` that has not started
    /// yet as failed. The failed task itself is not included.
    pub fn mark_dependents_failed(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();
        let mut newly_failed = Vec::new();

        while let Some(name) = stack.pop() {
            let Some(info) = self.tasks.get_mut(&name) else {
                continue;
            };
            if info.run_state == RunState::Pending {
                info.run_state = RunState::DoneFailed;
                debug!(
                    task = %info.name,
                    upstream = %failed_task,
                    "skipping task because a dependency failed"
                );
                newly_failed.push(info.name.clone());
                stack.extend(self.graph.dependents_of(&name).iter().cloned());
            }
        }

        newly_failed
    }

    /// Move every pending task whose dependencies all succeeded to
    /// `Running` and return them.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        // Walk in plan order so ties start dependencies-first.
        let candidates: Vec<TaskName> = self
            .graph
            .tasks()
            .filter(|name| {
                self.tasks.get(*name).is_some_and(|info| {
                    info.run_state == RunState::Pending && deps_satisfied(&*self.tasks, info)
                })
            })
            .map(str::to_string)
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for name in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                info!(task = %info.name, run_id = self.run_id, "starting task");
                info.run_state = RunState::Running;
                ready.push(ScheduledTask::from_task_info(info, self.run_id));
            }
        }
        ready
    }

    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.values().all(|info| info.run_state.is_terminal())
    }
}

/// True when every dependency of `info` finished successfully in this run.
pub fn deps_satisfied(tasks: &HashMap<TaskName, TaskInfo>, info: &TaskInfo) -> bool {
    info.deps.iter().all(|dep_name| match tasks.get(dep_name) {
        Some(dep) => dep.run_state == RunState::DoneSuccess,
        None => {
            warn!(
                task = %info.name,
                dep = %dep_name,
                "dependency missing from run"
            );
            false
        }
    })
}
