// src/pipeline/copy.rs

use std::path::Path;

use anyhow::Context;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::errors::{BuildError, Result};
use crate::pattern::MatchedPath;
use crate::pipeline::dest::write_atomic;

/// Copy matched files into `dest_dir`, keeping their paths relative to the
/// pattern base. Files are copied concurrently; the first error wins.
/// Returns the number of files actually rewritten.
pub async fn copy_matched(files: Vec<MatchedPath>, dest_dir: &Path) -> Result<usize> {
    let mut set = JoinSet::new();

    for file in files {
        let dest = dest_dir.join(&file.base_rel);
        set.spawn(async move {
            let bytes = tokio::fs::read(&file.abs)
                .await
                .with_context(|| format!("reading {:?}", file.abs))?;
            let written = write_atomic(&dest, bytes).await?;
            if written {
                debug!(from = %file.rel, to = ?dest, "copied file");
            }
            Ok::<bool, BuildError>(written)
        });
    }

    let mut copied = 0;
    while let Some(joined) = set.join_next().await {
        let written = joined
            .map_err(|e| BuildError::Other(anyhow::anyhow!("copy task aborted: {e}")))??;
        if written {
            copied += 1;
        }
    }

    info!(dest = ?dest_dir, copied, "copy finished");
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternSet;

    #[tokio::test]
    async fn preserves_base_relative_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src/fonts/sub")).unwrap();
        std::fs::write(root.join("src/fonts/sub/a.woff2"), b"font").unwrap();

        let matched = PatternSet::new(["src/fonts/**/*"]).unwrap().resolve(root).unwrap();
        let out = root.join("static/fonts");
        assert_eq!(copy_matched(matched.clone(), &out).await.unwrap(), 1);
        assert_eq!(std::fs::read(out.join("sub/a.woff2")).unwrap(), b"font");

        // Unchanged on the second pass.
        assert_eq!(copy_matched(matched, &out).await.unwrap(), 0);
    }
}
