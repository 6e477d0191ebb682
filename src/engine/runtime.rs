// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::errors::Result;

use super::core::CoreRuntime;
use super::executor::Executor;
use super::{CoreCommand, RuntimeEvent, TaskName};

/// Async shell around [`CoreRuntime`].
///
/// Reads events from the channel the watcher (and Ctrl-C handler) write
/// into, feeds them to the core, and starts the runs it asks for on the
/// shared [`Executor`]. A failed run is logged and reported back to the
/// core; it never stops the loop.
pub struct Runtime {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    event_tx: mpsc::Sender<RuntimeEvent>,
    executor: Arc<Executor>,
    current: Option<JoinHandle<()>>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// `event_tx` must feed `event_rx`; runs report their completion
    /// through it.
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        event_tx: mpsc::Sender<RuntimeEvent>,
        executor: Arc<Executor>,
    ) -> Self {
        Self {
            core,
            event_rx,
            event_tx,
            executor,
            current: None,
        }
    }

    /// Main event loop; returns once shutdown is requested.
    pub async fn run(mut self) -> Result<()> {
        info!("trigger runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                info!("shutdown requested; stopping runtime");
                break;
            }
        }

        if let Some(handle) = self.current.take() {
            if !handle.is_finished() {
                info!("aborting run in progress");
                handle.abort();
            }
        }

        info!("trigger runtime exiting");
        Ok(())
    }

    fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::StartRun(tasks) => self.start_run(tasks),
            CoreCommand::RequestExit => debug!("core issued RequestExit"),
        }
    }

    fn start_run(&mut self, tasks: Vec<TaskName>) {
        info!(?tasks, "starting triggered run");
        let executor = Arc::clone(&self.executor);
        let tx = self.event_tx.clone();

        self.current = Some(tokio::spawn(async move {
            let success = match executor.run_all(&tasks).await {
                Ok(_summary) => true,
                Err(err) => {
                    error!(?tasks, error = %err, "triggered run failed");
                    false
                }
            };
            let _ = tx.send(RuntimeEvent::RunFinished { tasks, success }).await;
        }));
    }
}
