// src/errors.rs

//! Crate-wide error type.
//!
//! Registration-time problems (`UnknownTask`, `CyclicDependency`) are raised
//! before any task action runs. Everything a task action can hit while it
//! runs travels back to the executor as a `Result`, never through a panic.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("unknown task '{name}'{}", required_by(.referenced_by))]
    UnknownTask {
        name: String,
        referenced_by: Option<String>,
    },

    #[error("cyclic task dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("source directory {base:?} for pattern '{pattern}' does not exist")]
    SourceNotFound { pattern: String, base: PathBuf },

    #[error("glob error for '{pattern}': {message}")]
    Glob { pattern: String, message: String },

    #[error("{stage} failed on {file}: {message}")]
    Transform {
        stage: String,
        file: String,
        message: String,
    },

    #[error("template error: {0}")]
    Template(String),

    #[error("{tool} reported {findings} finding(s)")]
    LintFailed { tool: String, findings: usize },

    #[error("task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: Box<BuildError>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("dev server error: {0}")]
    Server(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn required_by(referenced_by: &Option<String>) -> String {
    match referenced_by {
        Some(parent) => format!(" (required by '{parent}')"),
        None => String::new(),
    }
}

impl BuildError {
    pub fn unknown_task(name: impl Into<String>) -> Self {
        BuildError::UnknownTask {
            name: name.into(),
            referenced_by: None,
        }
    }

    pub fn transform(
        stage: impl Into<String>,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        BuildError::Transform {
            stage: stage.into(),
            file: file.into(),
            message: message.into(),
        }
    }

    /// Innermost error, looking through `TaskFailed` wrappers.
    pub fn root_cause(&self) -> &BuildError {
        match self {
            BuildError::TaskFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
