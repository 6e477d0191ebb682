// src/engine/mod.rs

//! Orchestration engine.
//!
//! - [`executor`] runs one resolved execution plan to completion.
//! - [`core`] is the pure state machine that decides when watch triggers
//!   start a new run and what gets queued meanwhile.
//! - [`runtime`] is the async shell that feeds events into the core and
//!   hands runs to the executor.
//! - [`context`] is what task actions get to see while they run.

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task action for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// A watched file changed.
    FileWatch,
}

/// Events flowing into the trigger runtime.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Run `task` (and whatever it depends on).
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// A run started by the runtime has finished.
    RunFinished {
        tasks: Vec<TaskName>,
        success: bool,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod context;
pub mod core;
pub mod event_handlers;
pub mod executor;
pub mod queue;
pub mod runtime;

pub use context::{ServiceHandle, Services, TaskContext};
pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use executor::{Executor, RunSummary};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
