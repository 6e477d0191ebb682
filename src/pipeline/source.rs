// src/pipeline/source.rs

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::errors::Result;
use crate::pattern::PatternSet;
use crate::pipeline::SourceFile;

/// Resolve `patterns` under `root` and read every match as text.
///
/// Files come back sorted by root-relative path. A missing base directory
/// is [`BuildError::SourceNotFound`](crate::errors::BuildError::SourceNotFound);
/// no match at all is an empty list.
pub async fn read_sources(root: &Path, patterns: &PatternSet) -> Result<Vec<SourceFile>> {
    let matched = patterns.resolve_async(root).await?;

    let mut files = Vec::with_capacity(matched.len());
    for m in matched {
        let text = tokio::fs::read_to_string(&m.abs)
            .await
            .with_context(|| format!("reading {:?}", m.abs))?;
        files.push(SourceFile::from_text(m.rel, &text));
    }

    debug!(patterns = %patterns, files = files.len(), "read sources");
    Ok(files)
}
