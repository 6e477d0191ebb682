// src/tasks/styles.rs

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::BuildConfig;
use crate::dag::{action_fn, Task};
use crate::errors::Result;
use crate::pattern::PatternSet;
use crate::pipeline::{
    read_sources, write_output, Autoprefix, Concat, CssCompress, CssNesting, Pipeline,
};
use crate::tasks::names;

pub fn task(cfg: Arc<BuildConfig>) -> Task {
    Task::new(names::STYLES).with_action(action_fn(move |_ctx| {
        let cfg = Arc::clone(&cfg);
        async move { build_styles(&cfg).await.map(|_| ()) }
    }))
}

/// Nesting and prefixes per file, then one concatenated stylesheet,
/// compressed in production.
pub fn pipeline(cfg: &BuildConfig) -> Pipeline {
    Pipeline::new()
        .pipe(CssNesting)
        .pipe(Autoprefix)
        .pipe(Concat::new(&cfg.names.styles))
        .pipe_if(cfg.env.is_production(), CssCompress)
}

pub async fn build_styles(cfg: &BuildConfig) -> Result<Vec<PathBuf>> {
    let patterns = PatternSet::new([cfg.paths.styles.as_str()])?;
    let sources = read_sources(&cfg.root, &patterns).await?;
    let out = pipeline(cfg).run(sources).await?;
    write_output(&cfg.build_path(), out, cfg.styles.source_maps).await
}
