// src/engine/context.rs

//! Shared state handed to every task action.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::devserver::{DevServerHandle, ReloadHub};
use crate::engine::RuntimeEvent;
use crate::watch::WatcherHandle;

/// A long-running service started by a task (watcher, dev server).
///
/// Services outlive the task that started them; the process keeps running
/// until they are stopped.
#[derive(Debug)]
pub enum ServiceHandle {
    Watcher(WatcherHandle),
    DevServer(DevServerHandle),
}

impl ServiceHandle {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceHandle::Watcher(_) => "watcher",
            ServiceHandle::DevServer(_) => "dev-server",
        }
    }

    pub async fn stop(self) {
        match self {
            ServiceHandle::Watcher(handle) => handle.stop(),
            ServiceHandle::DevServer(handle) => handle.stop().await,
        }
    }
}

/// Services started during this process.
#[derive(Debug, Clone, Default)]
pub struct Services {
    inner: Arc<Mutex<Vec<ServiceHandle>>>,
}

impl Services {
    fn lock(&self) -> MutexGuard<'_, Vec<ServiceHandle>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self, handle: ServiceHandle) {
        debug!(service = handle.name(), "service registered");
        self.lock().push(handle);
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Stop every registered service, newest first.
    pub async fn stop_all(&self) {
        let handles: Vec<ServiceHandle> = std::mem::take(&mut *self.lock());
        for handle in handles.into_iter().rev() {
            info!(service = handle.name(), "stopping service");
            handle.stop().await;
        }
    }
}

/// What a running task action can reach besides its own captured config.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    services: Services,
    reload: ReloadHub,
    triggers: Option<mpsc::Sender<RuntimeEvent>>,
}

impl TaskContext {
    pub fn new(
        services: Services,
        reload: ReloadHub,
        triggers: Option<mpsc::Sender<RuntimeEvent>>,
    ) -> Self {
        Self {
            services,
            reload,
            triggers,
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn reload(&self) -> &ReloadHub {
        &self.reload
    }

    /// Sender into the trigger runtime, if one is set up for this process.
    pub fn triggers(&self) -> Option<&mpsc::Sender<RuntimeEvent>> {
        self.triggers.as_ref()
    }
}
