// src/tasks/watch.rs

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::BuildConfig;
use crate::dag::{action_fn, Task};
use crate::devserver::ReloadHub;
use crate::engine::{ServiceHandle, TaskContext};
use crate::errors::Result;
use crate::tasks::names;
use crate::watch::{self, WatchHandler, WatchSet};

pub fn task(cfg: Arc<BuildConfig>) -> Task {
    Task::new(names::WATCH).with_action(action_fn(move |ctx: TaskContext| {
        let cfg = Arc::clone(&cfg);
        async move { start_watching(&cfg, &ctx) }
    }))
}

/// Sources re-run the task that consumes them; changes in the build
/// directory reload connected browsers.
pub fn watch_set(cfg: &BuildConfig, reload: ReloadHub) -> Result<WatchSet> {
    let use_hash = cfg.watch.use_hash;
    let build_glob = format!("{}/**/*", cfg.build_dir.trim_end_matches('/'));

    let mut set = WatchSet::new();
    set.bind(
        names::COMPILE,
        [cfg.paths.templates.as_str(), cfg.paths.context.as_str()],
        WatchHandler::Task(names::COMPILE.to_string()),
        use_hash,
    )?
    .bind(
        names::STYLES,
        [cfg.paths.styles.as_str()],
        WatchHandler::Task(names::STYLES.to_string()),
        use_hash,
    )?
    .bind(
        names::SCRIPTS,
        [cfg.paths.scripts.as_str()],
        WatchHandler::Task(names::SCRIPTS.to_string()),
        use_hash,
    )?
    .bind(
        "reload",
        [build_glob.as_str()],
        WatchHandler::callback(move |path| {
            info!(path = %path, "build output changed; reloading browsers");
            reload.reload();
        }),
        false,
    )?;
    Ok(set)
}

fn start_watching(cfg: &BuildConfig, ctx: &TaskContext) -> Result<()> {
    // The build directory may not exist before the first build; create it
    // so it gets its own subscription.
    std::fs::create_dir_all(cfg.build_path())?;
    let set = watch_set(cfg, ctx.reload().clone())?;
    let handle = watch::spawn(
        cfg.root.clone(),
        set,
        Duration::from_millis(cfg.watch.debounce_ms),
        ctx.triggers().cloned(),
    )?;
    ctx.services().add(ServiceHandle::Watcher(handle));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfigFile;
    use std::path::PathBuf;

    #[test]
    fn bindings_cover_sources_and_build_output() {
        let cfg = BuildConfig::from_raw(RawConfigFile::default(), PathBuf::from("/site")).unwrap();
        let set = watch_set(&cfg, ReloadHub::new()).unwrap();
        let target = |rel: &str| -> Vec<&str> {
            set.bindings()
                .iter()
                .filter(|b| b.matches(rel))
                .map(|b| b.label.as_str())
                .collect()
        };

        assert_eq!(target("src/templates/partials/header.hbs"), vec!["compile"]);
        assert_eq!(target("src/templates/test.json"), vec!["compile"]);
        assert_eq!(target("src/styles/base/a.css"), vec!["styles"]);
        assert_eq!(target("src/scripts/app.js"), vec!["scripts"]);
        assert_eq!(target("static/index.min.css"), vec!["reload"]);
        assert!(target("README.md").is_empty());
    }
}
