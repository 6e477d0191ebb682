// src/pattern.rs

//! Glob pattern sets shared by source matching, lint file sets and watch
//! bindings.
//!
//! A pattern set is a list of globs relative to the project root. Entries
//! starting with `!` exclude paths. `*` does not cross `/`; `**` spans any
//! number of directories.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::errors::{BuildError, Result};

/// A file found while resolving a [`PatternSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPath {
    /// Absolute (root-joined) path.
    pub abs: PathBuf,
    /// Path relative to the project root, `/`-separated.
    pub rel: String,
    /// Path relative to the literal base directory of the include pattern
    /// that matched it (e.g. `a/b.woff` for `src/fonts/**/*`).
    pub base_rel: String,
}

/// Compiled include/exclude globs.
#[derive(Clone)]
pub struct PatternSet {
    source: Vec<String>,
    includes: Vec<String>,
    include_set: GlobSet,
    exclude_set: Option<GlobSet>,
    pruned_dirs: Vec<String>,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet")
            .field("patterns", &self.source)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source.join(", "))
    }
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let source: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        for pat in &source {
            match pat.strip_prefix('!') {
                Some(rest) => excludes.push(normalize(rest)),
                None => includes.push(normalize(pat)),
            }
        }

        let include_set = build_globset(&includes)?;
        let exclude_set = if excludes.is_empty() {
            None
        } else {
            Some(build_globset(&excludes)?)
        };

        let pruned_dirs = excludes
            .iter()
            .filter_map(|ex| prunable_dir(ex))
            .collect();

        Ok(Self {
            source,
            includes,
            include_set,
            exclude_set,
            pruned_dirs,
        })
    }

    /// Pattern strings as given, exclusions included.
    pub fn patterns(&self) -> &[String] {
        &self.source
    }

    /// Returns true if `rel_path` (relative to the project root, with
    /// forward slashes) is included and not excluded.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Literal base directory of every include pattern, relative to root.
    pub fn base_dirs(&self) -> Vec<(String, String)> {
        self.includes
            .iter()
            .map(|p| (p.clone(), glob_base(p)))
            .collect()
    }

    /// Walk the base directories under `root` and return every matching
    /// file, sorted by relative path.
    ///
    /// A base directory that does not exist is a [`BuildError::SourceNotFound`];
    /// an unreadable directory is a [`BuildError::Glob`]. No match at all is
    /// simply an empty list.
    pub fn resolve(&self, root: &Path) -> Result<Vec<MatchedPath>> {
        let mut found: BTreeMap<String, MatchedPath> = BTreeMap::new();

        for (pattern, base) in self.base_dirs() {
            let base_abs = root.join(&base);
            if !base_abs.is_dir() {
                return Err(BuildError::SourceNotFound {
                    pattern,
                    base: base_abs,
                });
            }

            for rel in self.walk(root, &base, &pattern)? {
                if found.contains_key(&rel) || !self.matches(&rel) {
                    continue;
                }
                let base_rel = self.base_relative(&rel);
                found.insert(
                    rel.clone(),
                    MatchedPath {
                        abs: root.join(&rel),
                        rel,
                        base_rel,
                    },
                );
            }
        }

        debug!(patterns = %self, matched = found.len(), "resolved pattern set");
        Ok(found.into_values().collect())
    }

    /// [`resolve`](Self::resolve) on the blocking pool.
    pub async fn resolve_async(&self, root: &Path) -> Result<Vec<MatchedPath>> {
        let set = self.clone();
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || set.resolve(&root))
            .await
            .map_err(|e| BuildError::Glob {
                pattern: self.to_string(),
                message: format!("pattern resolution aborted: {e}"),
            })?
    }

    fn base_relative(&self, rel: &str) -> String {
        let idx = self
            .include_set
            .matches(rel)
            .into_iter()
            .next()
            .unwrap_or(0);
        let base = self.includes.get(idx).map(|p| glob_base(p)).unwrap_or_default();
        if base.is_empty() {
            return rel.to_string();
        }
        rel.strip_prefix(&base)
            .map(|s| s.trim_start_matches('/').to_string())
            .unwrap_or_else(|| rel.to_string())
    }

    /// Collect root-relative paths of all files below `base`.
    fn walk(&self, root: &Path, base: &str, pattern: &str) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let mut stack = vec![base.to_string()];

        while let Some(dir_rel) = stack.pop() {
            let dir_abs = root.join(&dir_rel);
            let entries = std::fs::read_dir(&dir_abs).map_err(|e| BuildError::Glob {
                pattern: pattern.to_string(),
                message: format!("reading {dir_abs:?}: {e}"),
            })?;

            for entry in entries {
                let entry = entry.map_err(|e| BuildError::Glob {
                    pattern: pattern.to_string(),
                    message: format!("reading entry in {dir_abs:?}: {e}"),
                })?;
                let name = entry.file_name().to_string_lossy().to_string();
                let rel = if dir_rel.is_empty() {
                    name
                } else {
                    format!("{dir_rel}/{name}")
                };

                let Ok(file_type) = entry.file_type() else {
                    continue;
                };
                if file_type.is_dir() {
                    if !self.pruned_dirs.iter().any(|d| d == &rel) {
                        stack.push(rel);
                    }
                } else if file_type.is_file()
                    || (file_type.is_symlink() && entry.path().is_file())
                {
                    files.push(rel);
                }
            }
        }

        Ok(files)
    }
}

/// Strip a leading `./` so patterns line up with root-relative paths.
fn normalize(pattern: &str) -> String {
    pattern.trim_start_matches("./").replace('\\', "/")
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .map_err(|e| BuildError::Glob {
                pattern: pat.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| BuildError::Glob {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

fn has_glob_meta(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Literal directory prefix of a glob (`src/styles` for
/// `src/styles/**/*.css`, `src/templates` for `src/templates/test.json`).
pub fn glob_base(pattern: &str) -> String {
    let components: Vec<&str> = pattern.split('/').collect();
    let literal: Vec<&str> = components
        .iter()
        .take_while(|c| !has_glob_meta(c))
        .copied()
        .collect();

    let dir_components = if literal.len() == components.len() {
        // Fully literal: the pattern names a file, its base is the parent.
        &literal[..literal.len().saturating_sub(1)]
    } else {
        &literal[..]
    };

    dir_components
        .iter()
        .filter(|c| !c.is_empty() && **c != ".")
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

/// `node_modules/**/*` and `node_modules/**` exclude a whole literal
/// directory, which lets the walker skip it entirely.
fn prunable_dir(exclude: &str) -> Option<String> {
    let dir = exclude
        .strip_suffix("/**/*")
        .or_else(|| exclude.strip_suffix("/**"))?;
    if dir.is_empty() || dir.split('/').any(has_glob_meta) {
        return None;
    }
    Some(dir.to_string())
}
