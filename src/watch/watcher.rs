// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::watch::binding::WatchSet;
use crate::watch::event_handler::{process_changes, seed_hashes, HashGate};
use crate::watch::path_utils::{is_content_event, relative_str};

/// Keeps the OS subscription and the event loop alive.
///
/// Dropping the handle, or calling [`stop`](Self::stop), releases both.
pub struct WatcherHandle {
    watcher: Option<RecommendedWatcher>,
    task: JoinHandle<()>,
    root: PathBuf,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl WatcherHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stop(mut self) {
        self.release();
        info!(root = ?self.root, "file watcher stopped");
    }

    fn release(&mut self) {
        // Dropping the notify watcher closes the event channel.
        self.watcher.take();
        self.task.abort();
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Watch the base directories of `set` and dispatch changes to its
/// bindings.
///
/// Events are coalesced over `debounce`, so each binding fires at most once
/// per window. Task handlers need `triggers`; without it their changes are
/// logged and dropped.
pub fn spawn(
    root: impl Into<PathBuf>,
    set: WatchSet,
    debounce: Duration,
    triggers: Option<mpsc::Sender<RuntimeEvent>>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // Fails only after the loop is gone.
                let _ = event_tx.send(event);
            }
            Err(err) => warn!("file watch error: {err}"),
        },
        Config::default(),
    )?;
    let dirs = watch_roots(&root, &set);
    for dir in &dirs {
        watcher.watch(dir, RecursiveMode::Recursive)?;
    }
    info!(root = ?root, dirs = ?dirs, bindings = set.len(), "file watcher started");

    let bindings = Arc::new(set.bindings().to_vec());
    let task = tokio::spawn(event_loop(
        root.clone(),
        bindings,
        event_rx,
        debounce,
        triggers,
    ));

    Ok(WatcherHandle {
        watcher: Some(watcher),
        task,
        root,
    })
}

/// Directories to subscribe to: the literal base of every binding
/// pattern, nested ones dropped. A base that does not exist yet is replaced
/// by its closest existing ancestor inside `root`.
pub fn watch_roots(root: &Path, set: &WatchSet) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = set
        .bindings()
        .iter()
        .flat_map(|binding| binding.patterns.base_dirs())
        .map(|(_, base)| existing_ancestor(root, &root.join(base)))
        .collect();
    // Parents sort before their children.
    dirs.sort();
    dirs.dedup();

    let mut roots: Vec<PathBuf> = Vec::new();
    for dir in dirs {
        if !roots.iter().any(|r| dir.starts_with(r)) {
            roots.push(dir);
        }
    }
    if roots.is_empty() {
        roots.push(root.to_path_buf());
    }
    roots
}

fn existing_ancestor(root: &Path, dir: &Path) -> PathBuf {
    dir.ancestors()
        .take_while(|d| d.starts_with(root))
        .find(|d| d.is_dir())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf())
}

async fn event_loop(
    root: PathBuf,
    bindings: Arc<Vec<crate::watch::WatchBinding>>,
    mut events: mpsc::UnboundedReceiver<Event>,
    debounce: Duration,
    triggers: Option<mpsc::Sender<RuntimeEvent>>,
) {
    let gate = Arc::new(Mutex::new(HashGate::default()));
    seed_hashes(&root, &bindings, &gate).await;

    while let Some(event) = events.recv().await {
        let mut changed = BTreeSet::new();
        collect(&root, event, &mut changed);

        // Keep collecting until the window closes.
        let deadline = Instant::now() + debounce;
        loop {
            match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(Some(event)) => collect(&root, event, &mut changed),
                Ok(None) => return,
                Err(_) => break,
            }
        }

        if changed.is_empty() {
            continue;
        }
        debug!(paths = ?changed, "debounced change batch");
        if !process_changes(&root, &changed, &bindings, triggers.as_ref(), &gate).await {
            break;
        }
    }
    debug!("watcher event loop finished");
}

fn collect(root: &Path, event: Event, changed: &mut BTreeSet<String>) {
    if !is_content_event(&event.kind) {
        return;
    }
    for path in &event.paths {
        match relative_str(root, path) {
            Some(rel) if !rel.is_empty() => {
                changed.insert(rel);
            }
            Some(_) => {}
            None => debug!(path = ?path, "event outside the watch root"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::WatchHandler;

    fn task(name: &str) -> WatchHandler {
        WatchHandler::Task(name.to_string())
    }

    #[test]
    fn only_pattern_bases_are_watched() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for sub in ["src/styles", "src/scripts", "static", "node_modules/pkg"] {
            std::fs::create_dir_all(root.join(sub)).unwrap();
        }

        let mut set = WatchSet::new();
        set.watch(["src/styles/**/*.css"], task("styles"))
            .unwrap()
            .watch(["src/scripts/*.js", "!src/scripts/vendor/**"], task("scripts"))
            .unwrap()
            .watch(["static/**/*"], task("reload"))
            .unwrap();
        assert_eq!(
            watch_roots(root, &set),
            vec![root.join("src/scripts"), root.join("src/styles"), root.join("static")]
        );

        set.watch(["src/**/*.hbs"], task("compile")).unwrap();
        assert_eq!(watch_roots(root, &set), vec![root.join("src"), root.join("static")]);
    }

    #[test]
    fn missing_base_falls_back_to_existing_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();

        let mut set = WatchSet::new();
        set.watch(["src/templates/**/*.hbs"], task("compile")).unwrap();
        assert_eq!(watch_roots(root, &set), vec![root.join("src")]);

        let mut set = WatchSet::new();
        set.watch(["dist/**/*"], task("reload")).unwrap();
        assert_eq!(watch_roots(root, &set), vec![root.to_path_buf()]);
        assert_eq!(watch_roots(root, &WatchSet::new()), vec![root.to_path_buf()]);
    }
}
