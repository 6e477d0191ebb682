// src/tasks/scripts.rs

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::BuildConfig;
use crate::dag::{action_fn, Task};
use crate::errors::Result;
use crate::pattern::PatternSet;
use crate::pipeline::{read_sources, write_output, Concat, ExternalCommand, JsMinify, Pipeline};
use crate::tasks::names;

pub fn task(cfg: Arc<BuildConfig>) -> Task {
    Task::new(names::SCRIPTS).with_action(action_fn(move |_ctx| {
        let cfg = Arc::clone(&cfg);
        async move { build_scripts(&cfg).await.map(|_| ()) }
    }))
}

/// Concatenate, transpile (when a command is configured), minify in
/// production.
pub fn pipeline(cfg: &BuildConfig) -> Pipeline {
    Pipeline::new()
        .pipe(Concat::new(&cfg.names.scripts))
        .pipe(ExternalCommand::new(
            "transpile",
            cfg.scripts.transpile_cmd.clone(),
            cfg.root.clone(),
        ))
        .pipe_if(cfg.env.is_production(), JsMinify)
}

pub async fn build_scripts(cfg: &BuildConfig) -> Result<Vec<PathBuf>> {
    let patterns = PatternSet::new([cfg.paths.scripts.as_str()])?;
    let sources = read_sources(&cfg.root, &patterns).await?;
    let out = pipeline(cfg).run(sources).await?;
    write_output(&cfg.build_path(), out, cfg.scripts.source_maps).await
}
