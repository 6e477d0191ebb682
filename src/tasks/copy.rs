// src/tasks/copy.rs

//! `fonts` and `assets`: plain copies into the build directory.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::BuildConfig;
use crate::dag::{action_fn, Task};
use crate::errors::Result;
use crate::pattern::{MatchedPath, PatternSet};
use crate::pipeline::copy_matched;
use crate::tasks::names;

pub fn fonts_task(cfg: Arc<BuildConfig>) -> Task {
    Task::new(names::FONTS).with_action(action_fn(move |_ctx| {
        let cfg = Arc::clone(&cfg);
        async move { copy_fonts(&cfg).await.map(|_| ()) }
    }))
}

pub fn assets_task(cfg: Arc<BuildConfig>) -> Task {
    Task::new(names::ASSETS).with_action(action_fn(move |_ctx| {
        let cfg = Arc::clone(&cfg);
        async move { copy_assets(&cfg).await.map(|_| ()) }
    }))
}

/// Copy font files whose extension is allowed into `<build>/<fonts_dir>`.
pub async fn copy_fonts(cfg: &BuildConfig) -> Result<usize> {
    let matched = PatternSet::new([cfg.paths.fonts.as_str()])?
        .resolve_async(&cfg.root)
        .await?;
    let fonts: Vec<MatchedPath> = matched
        .into_iter()
        .filter(|m| {
            let keep = has_extension(&m.rel, &cfg.fonts.extensions);
            if !keep {
                debug!(path = %m.rel, "not a font; skipped");
            }
            keep
        })
        .collect();
    copy_matched(fonts, &cfg.build_path().join(&cfg.names.fonts_dir)).await
}

pub async fn copy_assets(cfg: &BuildConfig) -> Result<usize> {
    let matched = PatternSet::new([cfg.paths.assets.as_str()])?
        .resolve_async(&cfg.root)
        .await?;
    copy_matched(matched, &cfg.build_path().join(&cfg.names.assets_dir)).await
}

/// Case-insensitive; entries may be given with or without the dot.
fn has_extension(path: &str, allowed: &[String]) -> bool {
    let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    allowed
        .iter()
        .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_filter() {
        let allowed = vec!["woff".to_string(), ".woff2".to_string()];
        assert!(has_extension("src/fonts/a.WOFF", &allowed));
        assert!(has_extension("src/fonts/b.woff2", &allowed));
        assert!(!has_extension("src/fonts/c.ttf", &allowed));
        assert!(!has_extension("src/fonts/README", &allowed));
    }
}
