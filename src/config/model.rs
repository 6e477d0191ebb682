// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{Environment, TriggerWhileRunningBehaviour};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [build]
/// env = "production"
/// dir = "static"
///
/// [paths]
/// styles = "src/styles/**/*.css"
///
/// [names]
/// styles = "index.min.css"
/// ```
///
/// All sections are optional and have defaults matching the usual
/// `src/` -> `static/` layout.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub names: NamesSection,
    #[serde(default)]
    pub fonts: FontsSection,
    #[serde(default)]
    pub styles: StylesSection,
    #[serde(default)]
    pub scripts: ScriptsSection,
    #[serde(default)]
    pub lint: LintSection,
    #[serde(default)]
    pub watch: WatchSection,
    #[serde(default)]
    pub server: ServerSection,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Environment name; `development` and `production` are recognised.
    #[serde(default)]
    pub env: Environment,

    /// Output directory, relative to the project root.
    #[serde(default = "default_build_dir")]
    pub dir: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            dir: default_build_dir(),
        }
    }
}

fn default_build_dir() -> String {
    "static".to_string()
}

/// `[paths]` section: source patterns, all relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
    #[serde(default = "default_templates")]
    pub templates: String,
    /// Root template, relative to `templates_dir`.
    #[serde(default = "default_root_template")]
    pub root_template: String,
    /// JSON file providing the template context.
    #[serde(default = "default_context")]
    pub context: String,
    #[serde(default = "default_styles")]
    pub styles: String,
    #[serde(default = "default_scripts")]
    pub scripts: String,
    #[serde(default = "default_fonts")]
    pub fonts: String,
    #[serde(default = "default_assets")]
    pub assets: String,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            templates: default_templates(),
            root_template: default_root_template(),
            context: default_context(),
            styles: default_styles(),
            scripts: default_scripts(),
            fonts: default_fonts(),
            assets: default_assets(),
        }
    }
}

fn default_templates_dir() -> String {
    "src/templates".to_string()
}

fn default_templates() -> String {
    "src/templates/**/*.hbs".to_string()
}

fn default_root_template() -> String {
    "index.hbs".to_string()
}

fn default_context() -> String {
    "src/templates/test.json".to_string()
}

fn default_styles() -> String {
    "src/styles/**/*.css".to_string()
}

fn default_scripts() -> String {
    "src/scripts/*.js".to_string()
}

fn default_fonts() -> String {
    "src/fonts/**/*".to_string()
}

fn default_assets() -> String {
    "src/**/*.png".to_string()
}

/// `[names]` section: output file and directory names inside the build dir.
#[derive(Debug, Clone, Deserialize)]
pub struct NamesSection {
    #[serde(default = "default_styles_name")]
    pub styles: String,
    #[serde(default = "default_scripts_name")]
    pub scripts: String,
    #[serde(default = "default_html_name")]
    pub html: String,
    #[serde(default = "default_fonts_dir")]
    pub fonts_dir: String,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
}

impl Default for NamesSection {
    fn default() -> Self {
        Self {
            styles: default_styles_name(),
            scripts: default_scripts_name(),
            html: default_html_name(),
            fonts_dir: default_fonts_dir(),
            assets_dir: default_assets_dir(),
        }
    }
}

fn default_styles_name() -> String {
    "index.min.css".to_string()
}

fn default_scripts_name() -> String {
    "index.min.js".to_string()
}

fn default_html_name() -> String {
    "index.html".to_string()
}

fn default_fonts_dir() -> String {
    "fonts".to_string()
}

fn default_assets_dir() -> String {
    "assets".to_string()
}

/// `[fonts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FontsSection {
    /// File extensions (without dot) that are copied; everything else under
    /// the fonts pattern is skipped.
    #[serde(default = "default_font_extensions")]
    pub extensions: Vec<String>,
}

impl Default for FontsSection {
    fn default() -> Self {
        Self {
            extensions: default_font_extensions(),
        }
    }
}

fn default_font_extensions() -> Vec<String> {
    vec!["woff".to_string(), "woff2".to_string()]
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    #[serde(default = "default_true")]
    pub source_maps: bool,
}

impl Default for StylesSection {
    fn default() -> Self {
        Self { source_maps: true }
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    #[serde(default = "default_true")]
    pub source_maps: bool,

    /// Shell command used as transpiler. It receives the concatenated
    /// script on stdin and must print the result on stdout. When unset,
    /// scripts pass through untouched.
    #[serde(default)]
    pub transpile_cmd: Option<String>,
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            source_maps: true,
            transpile_cmd: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[lint]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LintSection {
    #[serde(default = "default_lint_scripts")]
    pub scripts: Vec<String>,
    #[serde(default = "default_lint_styles")]
    pub styles: Vec<String>,
    /// External script linter; matched files are appended as arguments.
    #[serde(default)]
    pub eslint_cmd: Option<String>,
    /// External style linter; matched files are appended as arguments.
    #[serde(default)]
    pub stylelint_cmd: Option<String>,
    /// Fail the lint tasks when findings are reported.
    #[serde(default)]
    pub blocking: bool,
}

impl Default for LintSection {
    fn default() -> Self {
        Self {
            scripts: default_lint_scripts(),
            styles: default_lint_styles(),
            eslint_cmd: None,
            stylelint_cmd: None,
            blocking: false,
        }
    }
}

fn default_lint_scripts() -> Vec<String> {
    vec![
        "**/*.js".to_string(),
        "!node_modules/**/*".to_string(),
    ]
}

fn default_lint_styles() -> Vec<String> {
    vec![
        "**/*.css".to_string(),
        "!node_modules/**/*".to_string(),
    ]
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Window in which filesystem events are coalesced into one trigger.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of queued runs to remember.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,

    /// Re-run a task only when the content of its watched files changed,
    /// not on every event.
    #[serde(default)]
    pub use_hash: bool,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
            use_hash: false,
        }
    }
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_queue_length() -> usize {
    1
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Validated, immutable configuration for one process invocation.
///
/// Construct via `BuildConfig::from_raw` (see `config::validate`); the
/// fields mirror `RawConfigFile` plus the project root every relative path
/// is resolved against.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub env: Environment,
    pub root: PathBuf,
    pub build_dir: String,
    pub paths: PathsSection,
    pub names: NamesSection,
    pub fonts: FontsSection,
    pub styles: StylesSection,
    pub scripts: ScriptsSection,
    pub lint: LintSection,
    pub watch: WatchSection,
    pub server: ServerSection,
}

impl BuildConfig {
    pub(crate) fn new_unchecked(raw: RawConfigFile, root: PathBuf) -> Self {
        Self {
            env: raw.build.env,
            root,
            build_dir: raw.build.dir,
            paths: raw.paths,
            names: raw.names,
            fonts: raw.fonts,
            styles: raw.styles,
            scripts: raw.scripts,
            lint: raw.lint,
            watch: raw.watch,
            server: raw.server,
        }
    }

    /// Absolute (root-joined) build directory.
    pub fn build_path(&self) -> PathBuf {
        self.root.join(&self.build_dir)
    }

    /// Join a root-relative path onto the project root.
    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    /// Path of the root template file.
    pub fn root_template_path(&self) -> PathBuf {
        self.root
            .join(&self.paths.templates_dir)
            .join(&self.paths.root_template)
    }

    /// Same configuration with a different environment.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }
}
