// src/tasks/compile.rs

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::dag::{action_fn, Task};
use crate::errors::Result;
use crate::pattern::PatternSet;
use crate::pipeline::{write_atomic, TemplateRenderer};
use crate::tasks::names;

pub fn task(cfg: Arc<BuildConfig>) -> Task {
    Task::new(names::COMPILE).with_action(action_fn(move |_ctx| {
        let cfg = Arc::clone(&cfg);
        async move { compile(&cfg).await.map(|_| ()) }
    }))
}

/// Render the root template into `<build>/<names.html>`.
///
/// Every file matched by the template glob is available as a partial
/// under its file stem (`{{> header}}` for `partials/header.hbs`).
/// Returns whether the output file was rewritten.
pub async fn compile(cfg: &BuildConfig) -> Result<bool> {
    let partials = PatternSet::new([cfg.paths.templates.as_str()])?
        .resolve_async(&cfg.root)
        .await?;

    let mut renderer = TemplateRenderer::new();
    let mut seen: HashMap<String, String> = HashMap::new();
    for partial in &partials {
        let Some(stem) = Path::new(&partial.rel).file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some(previous) = seen.insert(stem.to_string(), partial.rel.clone()) {
            warn!(partial = %stem, replaced = %previous, by = %partial.rel, "duplicate partial name");
        }
        let source = tokio::fs::read_to_string(&partial.abs)
            .await
            .with_context(|| format!("reading partial {:?}", partial.abs))?;
        renderer.register_partial(stem, &source)?;
    }

    let context_path = cfg.resolve(&cfg.paths.context);
    let context_text = tokio::fs::read_to_string(&context_path)
        .await
        .with_context(|| format!("reading template context {context_path:?}"))?;
    let context: serde_json::Value = serde_json::from_str(&context_text)?;

    let root_path = cfg.root_template_path();
    let root_source = tokio::fs::read_to_string(&root_path)
        .await
        .with_context(|| format!("reading root template {root_path:?}"))?;

    let html = renderer.render(&cfg.paths.root_template, &root_source, &context)?;
    let dest = cfg.build_path().join(&cfg.names.html);
    let written = write_atomic(&dest, html.into_bytes()).await?;
    info!(path = ?dest, partials = partials.len(), written, "compiled templates");
    Ok(written)
}
