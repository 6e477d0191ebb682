//! Throwaway project trees for integration tests.

use std::path::{Path, PathBuf};

use sitedag::config::{BuildConfig, RawConfigFile};
use sitedag::types::Environment;
use tempfile::TempDir;

/// A project root in a temp directory, laid out like the default config
/// expects (`src/...` in, `static/` out).
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    /// Empty project.
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Project with one template, context, stylesheet, script and font.
    pub fn standard() -> Self {
        let site = Self::empty();
        site.write("src/templates/index.hbs", "<h1>{{capitals title}}</h1>\n{{> footer}}\n")
            .write("src/templates/partials/footer.hbs", "<footer>{{year}}</footer>")
            .write("src/templates/test.json", r#"{"title": "hi", "year": 2024}"#)
            .write("src/styles/a.css", ".x {\n  .y { color: red }\n}\n")
            .write("src/scripts/app.js", "// app\nfunction add ( a, b ) {\n    return a + b;\n}\n")
            .write("src/fonts/a.woff2", "font")
            .write("src/fonts/notes.txt", "not a font");
        site
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, contents).expect("write fixture file");
        self
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Default configuration rooted here.
    pub fn config(&self, env: Environment) -> BuildConfig {
        self.config_with(env, |_| {})
    }

    /// Default configuration rooted here, adjusted by `edit`.
    pub fn config_with(&self, env: Environment, edit: impl FnOnce(&mut RawConfigFile)) -> BuildConfig {
        let mut raw = RawConfigFile::default();
        edit(&mut raw);
        BuildConfig::from_raw(raw, self.root().to_path_buf())
            .expect("fixture config is valid")
            .with_env(env)
    }
}
