// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{BuildConfig, RawConfigFile};
use crate::errors::{BuildError, Result};
use crate::types::Environment;

/// Environment variable that overrides `[build].env`.
pub const ENV_VAR: &str = "SITEDAG_ENV";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// The directory containing the file becomes the project root.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<BuildConfig> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    BuildConfig::from_raw(raw, config_root_dir(path))
}

/// Resolve the configuration the CLI should use.
///
/// - An explicit path must exist.
/// - Without one, [`default_config_path`] is used when present, otherwise
///   the built-in defaults rooted at the current directory.
pub fn load_or_default(explicit: Option<&Path>) -> Result<BuildConfig> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(BuildError::Config(format!(
                "config file {path:?} does not exist"
            )));
        }
        return load_and_validate(path);
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        debug!(path = ?default_path, "loading default config file");
        return load_and_validate(&default_path);
    }

    info!(
        path = ?default_path,
        "no config file found; using built-in defaults"
    );
    BuildConfig::from_raw(RawConfigFile::default(), current_dir())
}

/// Pick the environment for this invocation.
///
/// Precedence: CLI flag, then `SITEDAG_ENV`, then the config file value.
pub fn effective_env(
    cli_env: Option<&str>,
    env_var: Option<String>,
    from_file: &Environment,
) -> Environment {
    if let Some(env) = cli_env {
        return Environment::from(env.to_string());
    }
    match env_var {
        Some(v) if !v.trim().is_empty() => Environment::from(v),
        _ => from_file.clone(),
    }
}

/// Helper to resolve a default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Sitedag.toml")
}

/// Figure out the project root from the config path.
///
/// - If the config path has a non-empty parent (e.g. "site/Sitedag.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Sitedag.toml" (parent = ""),
///   we fall back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => current_dir(),
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_env_wins_over_variable_and_file() {
        let env = effective_env(
            Some("production"),
            Some("development".into()),
            &Environment::Other("x".into()),
        );
        assert_eq!(env, Environment::Production);
    }

    #[test]
    fn variable_wins_over_file_unless_blank() {
        let file = Environment::Development;
        assert_eq!(
            effective_env(None, Some("production".into()), &file),
            Environment::Production
        );
        assert_eq!(effective_env(None, Some("  ".into()), &file), file);
        assert_eq!(effective_env(None, None, &file), file);
    }

    #[test]
    fn root_is_config_parent() {
        assert_eq!(
            config_root_dir(Path::new("site/Sitedag.toml")),
            PathBuf::from("site")
        );
    }
}
