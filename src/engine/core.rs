// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! Consumes [`RuntimeEvent`]s and returns the commands the async shell
//! should carry out. No channels, no Tokio, no IO, so the trigger
//! semantics can be unit tested directly.

use crate::engine::event_handlers::{
    handle_run_finished, handle_task_trigger, CoreCommand, CoreStep,
};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, TaskName};
use crate::types::TriggerWhileRunningBehaviour;

#[derive(Debug)]
pub struct CoreRuntime {
    /// Roots of the run currently executing, if any.
    running: Option<Vec<TaskName>>,
    queue: TriggerQueue,
}

impl CoreRuntime {
    pub fn new(behaviour: TriggerWhileRunningBehaviour, queue_length: usize) -> Self {
        Self {
            running: None,
            queue: TriggerQueue::new(behaviour, queue_length),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_none()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_trigger(&mut self.running, &mut self.queue, task, reason)
            }
            RuntimeEvent::RunFinished { tasks, success } => {
                handle_run_finished(&mut self.running, &mut self.queue, tasks, success)
            }
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: vec![CoreCommand::RequestExit],
                keep_running: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TriggerReason;

    fn trigger(task: &str) -> RuntimeEvent {
        RuntimeEvent::TaskTriggered {
            task: task.to_string(),
            reason: TriggerReason::FileWatch,
        }
    }

    fn finished(tasks: &[&str]) -> RuntimeEvent {
        RuntimeEvent::RunFinished {
            tasks: tasks.iter().map(|s| s.to_string()).collect(),
            success: true,
        }
    }

    #[test]
    fn idle_trigger_starts_run() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, 1);
        let step = core.step(trigger("styles"));
        assert_eq!(step.commands, vec![CoreCommand::StartRun(vec!["styles".into()])]);
        assert!(!core.is_idle());
    }

    #[test]
    fn triggers_during_run_become_one_follow_up_run() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, 1);
        core.step(trigger("styles"));
        assert!(core.step(trigger("scripts")).commands.is_empty());
        assert!(core.step(trigger("styles")).commands.is_empty());

        let step = core.step(finished(&["styles"]));
        assert_eq!(
            step.commands,
            vec![CoreCommand::StartRun(vec!["scripts".into(), "styles".into()])]
        );

        let step = core.step(finished(&["scripts", "styles"]));
        assert!(step.commands.is_empty());
        assert!(core.is_idle());
        assert!(core.queue_is_empty());
    }

    #[test]
    fn shutdown_stops_loop() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Cancel, 1);
        let step = core.step(RuntimeEvent::ShutdownRequested);
        assert!(!step.keep_running);
    }
}
