// src/pipeline/mod.rs

//! Stream pipeline: read sources, push them through stages, write outputs.
//!
//! Files travel through the pipeline as [`SourceFile`]s, a list of text
//! lines where each line remembers the source file and line it came from.
//! Stages keep those origins when they rewrite lines, which is what lets
//! [`dest`] emit a source map for the final output.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::errors::Result;

pub mod concat;
pub mod copy;
pub mod css;
pub mod dest;
pub mod external;
pub mod js;
pub mod source;
pub mod sourcemap;
pub mod template;

pub use concat::Concat;
pub use copy::copy_matched;
pub use css::{Autoprefix, CssCompress, CssNesting};
pub use dest::{write_atomic, write_output};
pub use external::ExternalCommand;
pub use js::JsMinify;
pub use source::read_sources;
pub use template::TemplateRenderer;

/// Where a line came from: source path and zero-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub source: Arc<str>,
    pub line: u32,
}

/// One line of text plus its origin, if known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub origin: Option<Origin>,
}

impl Line {
    pub fn new(text: impl Into<String>, origin: Option<Origin>) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }
}

/// Original text of a source, kept for `sourcesContent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub name: Arc<str>,
    pub content: Arc<str>,
}

/// A file in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Output-relative path (`/`-separated).
    pub path: String,
    pub lines: Vec<Line>,
    /// Every source that contributed lines, in first-use order.
    pub sources: Vec<SourceText>,
}

impl SourceFile {
    /// A file read from disk: every line maps to itself.
    pub fn from_text(path: impl Into<String>, text: &str) -> Self {
        let path = path.into();
        let name: Arc<str> = Arc::from(path.as_str());
        let lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| {
                Line::new(
                    line,
                    Some(Origin {
                        source: Arc::clone(&name),
                        line: idx as u32,
                    }),
                )
            })
            .collect();

        Self {
            path,
            lines,
            sources: vec![SourceText {
                name,
                content: Arc::from(text),
            }],
        }
    }

    /// Same file, new lines.
    pub fn with_lines(&self, lines: Vec<Line>) -> Self {
        Self {
            path: self.path.clone(),
            lines,
            sources: self.sources.clone(),
        }
    }

    /// Origin of the `idx`-th line, if any.
    pub fn origin_of(&self, idx: usize) -> Option<Origin> {
        self.lines.get(idx).and_then(|l| l.origin.clone())
    }

    /// Joined text with a trailing newline (empty file stays empty).
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.text.trim().is_empty())
    }
}

/// Future returned by a stage.
pub type StageFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<SourceFile>>> + Send + 'a>>;

/// One transform step. A stage receives the whole batch so it can merge
/// (concat) as well as map files.
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, files: Vec<SourceFile>) -> StageFuture<'_>;
}

/// Apply a fallible per-file transform to a batch.
pub(crate) fn map_files<F>(files: Vec<SourceFile>, mut f: F) -> Result<Vec<SourceFile>>
where
    F: FnMut(SourceFile) -> Result<SourceFile>,
{
    files.into_iter().map(&mut f).collect()
}

/// Ordered list of stages.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|s| s.name()))
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipe(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Add a stage only when `cond` holds.
    pub fn pipe_if(self, cond: bool, stage: impl Stage + 'static) -> Self {
        if cond { self.pipe(stage) } else { self }
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run `files` through every stage, left to right.
    pub async fn run(&self, mut files: Vec<SourceFile>) -> Result<Vec<SourceFile>> {
        for stage in &self.stages {
            debug!(stage = stage.name(), files = files.len(), "applying stage");
            files = stage.apply(files).await?;
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Stage for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn apply(&self, files: Vec<SourceFile>) -> StageFuture<'_> {
            Box::pin(async move {
                map_files(files, |f| {
                    let lines = f
                        .lines
                        .iter()
                        .map(|l| Line::new(l.text.to_uppercase(), l.origin.clone()))
                        .collect();
                    Ok(f.with_lines(lines))
                })
            })
        }
    }

    #[test]
    fn from_text_maps_each_line_to_itself() {
        let f = SourceFile::from_text("a.css", "x\ny\n");
        assert_eq!(f.lines.len(), 2);
        assert_eq!(f.origin_of(1).map(|o| o.line), Some(1));
        assert_eq!(f.text(), "x\ny\n");
    }

    #[tokio::test]
    async fn pipeline_applies_stages_in_order() {
        let p = Pipeline::new()
            .pipe(Upper)
            .pipe(Concat::new("out.txt"))
            .pipe_if(false, Upper);
        assert_eq!(p.stage_names(), vec!["upper", "concat"]);

        let out = p
            .run(vec![
                SourceFile::from_text("a", "a"),
                SourceFile::from_text("b", "b"),
            ])
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text(), "A\nB\n");
    }
}
