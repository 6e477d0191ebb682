// src/config/validate.rs

use std::path::PathBuf;

use crate::config::model::{BuildConfig, RawConfigFile};
use crate::errors::{BuildError, Result};
use crate::pattern::PatternSet;

impl BuildConfig {
    /// Validate a raw config and fix its project root.
    pub fn from_raw(raw: RawConfigFile, root: PathBuf) -> Result<Self> {
        validate_raw_config(&raw)?;
        Ok(BuildConfig::new_unchecked(raw, root))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_names(cfg)?;
    validate_patterns(cfg)?;
    validate_global_config(cfg)?;
    Ok(())
}

fn validate_names(cfg: &RawConfigFile) -> Result<()> {
    let names = [
        ("build.dir", &cfg.build.dir),
        ("names.styles", &cfg.names.styles),
        ("names.scripts", &cfg.names.scripts),
        ("names.html", &cfg.names.html),
        ("names.fonts_dir", &cfg.names.fonts_dir),
        ("names.assets_dir", &cfg.names.assets_dir),
        ("paths.root_template", &cfg.paths.root_template),
    ];

    for (key, value) in names {
        if value.trim().is_empty() {
            return Err(BuildError::Config(format!("{key} must not be empty")));
        }
    }

    for (key, value) in [
        ("names.styles", &cfg.names.styles),
        ("names.scripts", &cfg.names.scripts),
        ("names.html", &cfg.names.html),
    ] {
        if value.contains('/') || value.contains('\\') {
            return Err(BuildError::Config(format!(
                "{key} must be a plain file name (got '{value}')"
            )));
        }
    }

    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    let singles = [
        &cfg.paths.templates,
        &cfg.paths.styles,
        &cfg.paths.scripts,
        &cfg.paths.fonts,
        &cfg.paths.assets,
    ];
    for pattern in singles {
        PatternSet::new([pattern.as_str()])?;
    }

    PatternSet::new(&cfg.lint.scripts)?;
    PatternSet::new(&cfg.lint.styles)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.queue_length == 0 {
        return Err(BuildError::Config(
            "[watch].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.fonts.extensions.is_empty() {
        return Err(BuildError::Config(
            "[fonts].extensions must list at least one extension".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = BuildConfig::from_raw(RawConfigFile::default(), PathBuf::from("/site")).unwrap();
        assert_eq!(cfg.build_path(), PathBuf::from("/site/static"));
        assert_eq!(
            cfg.root_template_path(),
            PathBuf::from("/site/src/templates/index.hbs")
        );
    }

    #[test]
    fn rejects_zero_queue_length() {
        let mut raw = RawConfigFile::default();
        raw.watch.queue_length = 0;
        let err = BuildConfig::from_raw(raw, PathBuf::from(".")).unwrap_err();
        assert!(matches!(err, BuildError::Config(msg) if msg.contains("queue_length")));
    }

    #[test]
    fn rejects_nested_output_names() {
        let mut raw = RawConfigFile::default();
        raw.names.styles = "css/index.css".into();
        assert!(BuildConfig::from_raw(raw, PathBuf::from(".")).is_err());
    }

    #[test]
    fn rejects_invalid_globs() {
        let mut raw = RawConfigFile::default();
        raw.paths.styles = "src/[styles/*.css".into();
        let err = BuildConfig::from_raw(raw, PathBuf::from(".")).unwrap_err();
        assert!(matches!(err, BuildError::Glob { .. }));
    }
}
