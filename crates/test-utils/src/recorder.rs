//! Task actions that record what ran, for executor tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sitedag::dag::{action_fn, Task};
use sitedag::errors::BuildError;

/// Shared log of `start:<task>` / `end:<task>` entries.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Tasks that finished, in completion order.
    pub fn finished(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("end:").map(str::to_string))
            .collect()
    }

    pub fn count(&self, task: &str) -> usize {
        self.finished().iter().filter(|t| *t == task).count()
    }

    /// Position of `entry` in the log.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.events().iter().position(|e| e == entry)
    }

    fn push(&self, entry: String) {
        self.events.lock().unwrap().push(entry);
    }

    /// Task that records its start, sleeps `delay`, then records its end.
    pub fn task(&self, name: &str, deps: &[&str], delay: Duration) -> Task {
        let recorder = self.clone();
        let task_name = name.to_string();
        Task::new(name)
            .after(deps.iter().copied())
            .with_action(action_fn(move |_ctx| {
                let recorder = recorder.clone();
                let name = task_name.clone();
                async move {
                    recorder.push(format!("start:{name}"));
                    tokio::time::sleep(delay).await;
                    recorder.push(format!("end:{name}"));
                    Ok(())
                }
            }))
    }

    /// Task that records its start and then fails.
    pub fn failing_task(&self, name: &str, deps: &[&str]) -> Task {
        let recorder = self.clone();
        let task_name = name.to_string();
        Task::new(name)
            .after(deps.iter().copied())
            .with_action(action_fn(move |_ctx| {
                let recorder = recorder.clone();
                let name = task_name.clone();
                async move {
                    recorder.push(format!("start:{name}"));
                    Err(BuildError::Other(anyhow::anyhow!("{name} failed on purpose")))
                }
            }))
    }
}
