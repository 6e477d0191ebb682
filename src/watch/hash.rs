// src/watch/hash.rs

//! Content hashing for `use_hash` bindings.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Hash of a single file's content, hex encoded.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {path:?}"))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Combine per-file hashes; callers pass them sorted by path.
pub fn compute_aggregate_hash<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut hasher = Hasher::new();
    for (path, hash) in entries {
        hasher.update(path.as_bytes());
        hasher.update(&[0]);
        hasher.update(hash.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Per-file hash cache; only changed files are re-read.
#[derive(Debug, Default)]
pub struct FileHashCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileHashCache {
    pub fn get_or_compute(&mut self, path: &Path) -> Result<String> {
        if let Some(hash) = self.hashes.get(path) {
            return Ok(hash.clone());
        }
        debug!(path = ?path, "hash cache miss");
        let hash = compute_file_hash(path)?;
        self.hashes.insert(path.to_path_buf(), hash.clone());
        Ok(hash)
    }

    pub fn invalidate(&mut self, path: &Path) {
        self.hashes.remove(path);
    }
}

/// Last aggregate hash per binding label. Lives as long as the watcher.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<String, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, label: &str) -> Option<&str> {
        self.map.get(label).map(String::as_str)
    }

    /// Store `hash`; returns true when it differs from the previous one.
    pub fn update(&mut self, label: &str, hash: String) -> bool {
        match self.map.get(label) {
            Some(old) if *old == hash => false,
            _ => {
                self.map.insert(label.to_string(), hash);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_depends_on_paths_and_content() {
        let a = compute_aggregate_hash([("a.css", "1"), ("b.css", "2")]);
        let b = compute_aggregate_hash([("a.css", "1"), ("b.css", "3")]);
        let c = compute_aggregate_hash([("a.css", "1"), ("c.css", "2")]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn store_reports_changes_only() {
        let mut store = MemoryHashStore::new();
        assert!(store.update("styles", "x".into()));
        assert!(!store.update("styles", "x".into()));
        assert!(store.update("styles", "y".into()));
        assert_eq!(store.load("styles"), Some("y"));
    }

    #[test]
    fn cache_recomputes_after_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one").unwrap();

        let mut cache = FileHashCache::default();
        let first = cache.get_or_compute(&path).unwrap();
        std::fs::write(&path, "two").unwrap();
        assert_eq!(cache.get_or_compute(&path).unwrap(), first);
        cache.invalidate(&path);
        assert_ne!(cache.get_or_compute(&path).unwrap(), first);
    }
}
