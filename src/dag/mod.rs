// src/dag/mod.rs

//! Task graph definition and per-run scheduling.
//!
//! - [`registry`] stores named tasks and resolves execution plans.
//! - [`graph`] is the adjacency view of one plan.
//! - [`scheduler`] is the per-run state machine that decides which tasks
//!   may start and fails dependents of failed tasks.
//! - [`state_manager`] holds the individual state transitions.

pub mod graph;
pub mod registry;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::DagGraph;
pub use registry::{action_fn, ExecutionPlan, Task, TaskAction, TaskFuture, TaskRegistry};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{RunState, ScheduledTask};
