// src/pipeline/dest.rs

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::{BuildError, Result};
use crate::pipeline::sourcemap::{mapping_url_comment, SourceMap};
use crate::pipeline::SourceFile;

/// Write every file of the batch under `dir`.
///
/// With `source_maps`, each file gets a `<name>.map` sidecar and a
/// `sourceMappingURL` comment. Returns the paths actually rewritten.
pub async fn write_output(
    dir: &Path,
    files: Vec<SourceFile>,
    source_maps: bool,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for file in files {
        let dest = dir.join(&file.path);
        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.path.clone());

        let mut text = file.text();
        if source_maps {
            let map_name = format!("{file_name}.map");
            let map = SourceMap::for_file(&file, &file_name);
            let map_path = dest.with_file_name(&map_name);
            if write_atomic(&map_path, map.to_json()?.into_bytes()).await? {
                written.push(map_path);
            }
            text.push_str(&mapping_url_comment(&file_name, &map_name));
            text.push('\n');
        }

        if write_atomic(&dest, text.into_bytes()).await? {
            info!(path = ?dest, "wrote output");
            written.push(dest);
        }
    }

    Ok(written)
}

/// Replace `path` with `contents` atomically.
///
/// The data goes to a temp file in the same directory which is then
/// renamed over the target. Returns `false` without touching the file when
/// it already holds identical content.
pub async fn write_atomic(path: &Path, contents: Vec<u8>) -> Result<bool> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&owned, &contents))
        .await
        .map_err(|e| BuildError::Other(anyhow::anyhow!("writing {path:?} aborted: {e}")))?
}

fn write_atomic_blocking(path: &Path, contents: &[u8]) -> Result<bool> {
    if let Ok(existing) = std::fs::read(path) {
        if blake3::hash(&existing) == blake3::hash(contents) {
            debug!(path = ?path, "content unchanged; skipping write");
            return Ok(false);
        }
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {dir:?}"))?;

    let mut tmp = NamedTempFile::new_in(&dir).with_context(|| format!("temp file in {dir:?}"))?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| BuildError::Io(e.error))?;
    Ok(true)
}
