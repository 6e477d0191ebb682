// src/watch/event_handler.rs

//! Turns one debounced batch of changed paths into handler calls.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::errors::BuildError;
use crate::watch::binding::{WatchBinding, WatchHandler};
use crate::watch::hash::{compute_aggregate_hash, FileHashCache, MemoryHashStore};

/// Hash state of the `use_hash` bindings.
#[derive(Debug, Default)]
pub struct HashGate {
    cache: FileHashCache,
    store: MemoryHashStore,
}

impl HashGate {
    /// Recompute the binding's aggregate hash; true when it changed.
    fn changed(&mut self, root: &Path, binding: &WatchBinding) -> anyhow::Result<bool> {
        let hash = self.aggregate(root, binding)?;
        Ok(self.store.update(&binding.label, hash))
    }

    fn aggregate(&mut self, root: &Path, binding: &WatchBinding) -> anyhow::Result<String> {
        let files = match binding.patterns.resolve(root) {
            Ok(files) => files,
            Err(BuildError::SourceNotFound { .. }) => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let hash = self.cache.get_or_compute(&file.abs)?;
            entries.push((file.rel, hash));
        }
        Ok(compute_aggregate_hash(
            entries.iter().map(|(p, h)| (p.as_str(), h.as_str())),
        ))
    }
}

/// Record the starting hash of every `use_hash` binding so the first
/// unrelated event does not count as a change.
pub async fn seed_hashes(root: &Path, bindings: &Arc<Vec<WatchBinding>>, gate: &Arc<Mutex<HashGate>>) {
    if !bindings.iter().any(|b| b.use_hash) {
        return;
    }
    let root = root.to_path_buf();
    let bindings = Arc::clone(bindings);
    let gate = Arc::clone(gate);
    let seeded = tokio::task::spawn_blocking(move || {
        let mut gate = gate.lock().unwrap_or_else(|p| p.into_inner());
        for binding in bindings.iter().filter(|b| b.use_hash) {
            if let Err(err) = gate.changed(&root, binding) {
                warn!(binding = %binding.label, error = %err, "could not seed content hash");
            }
        }
    })
    .await;
    if let Err(err) = seeded {
        warn!(error = %err, "hash seeding aborted");
    }
}

/// Fire every binding matched by `changed` at most once.
///
/// Returns false once the trigger runtime has gone away.
pub async fn process_changes(
    root: &Path,
    changed: &BTreeSet<String>,
    bindings: &Arc<Vec<WatchBinding>>,
    triggers: Option<&mpsc::Sender<RuntimeEvent>>,
    gate: &Arc<Mutex<HashGate>>,
) -> bool {
    let mut fired_tasks: HashSet<&str> = HashSet::new();

    for binding in bindings.iter() {
        let Some(first) = changed.iter().find(|rel| binding.matches(rel)) else {
            continue;
        };

        if binding.use_hash && !content_changed(root, changed, binding, gate).await {
            info!(binding = %binding.label, path = %first, "content unchanged; skipping");
            continue;
        }

        match &binding.handler {
            WatchHandler::Task(task) => {
                if !fired_tasks.insert(task.as_str()) {
                    continue;
                }
                debug!(task = %task, path = %first, "watch match -> triggering task");
                let Some(tx) = triggers else {
                    warn!(task = %task, "no trigger runtime; change ignored");
                    continue;
                };
                let event = RuntimeEvent::TaskTriggered {
                    task: task.clone(),
                    reason: TriggerReason::FileWatch,
                };
                if let Err(err) = tx.send(event).await {
                    warn!("trigger runtime closed: {err}");
                    return false;
                }
            }
            WatchHandler::Callback(callback) => {
                debug!(binding = %binding.label, path = %first, "watch match -> callback");
                callback(first);
            }
        }
    }
    true
}

async fn content_changed(
    root: &Path,
    changed: &BTreeSet<String>,
    binding: &WatchBinding,
    gate: &Arc<Mutex<HashGate>>,
) -> bool {
    let root = root.to_path_buf();
    let changed: Vec<String> = changed.iter().cloned().collect();
    let binding = binding.clone();
    let gate = Arc::clone(gate);

    tokio::task::spawn_blocking(move || {
        let mut gate = gate.lock().unwrap_or_else(|p| p.into_inner());
        for rel in &changed {
            gate.cache.invalidate(&root.join(rel));
        }
        gate.changed(&root, &binding).unwrap_or_else(|err| {
            warn!(binding = %binding.label, error = %err, "hashing failed; firing anyway");
            true
        })
    })
    .await
    .unwrap_or(true)
}
