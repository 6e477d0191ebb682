#![allow(dead_code)]

use std::sync::Arc;

use sitedag::dag::{Task, TaskRegistry};
use sitedag::engine::{Executor, TaskContext};

pub use sitedag_test_utils::{init_tracing, with_timeout, Recorder, SiteFixture};

/// Executor over `tasks` with an empty context.
pub fn executor_for(tasks: Vec<Task>) -> Executor {
    let mut registry = TaskRegistry::new();
    for task in tasks {
        registry.register(task);
    }
    Executor::new(Arc::new(registry), TaskContext::default())
}
