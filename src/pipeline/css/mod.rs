// src/pipeline/css/mod.rs

//! Style stages: nesting expansion, vendor prefixing, compression.
//!
//! Every stage parses its input, so stages can be combined in any order.

pub mod nesting;
pub mod parser;
pub mod prefix;
pub mod render;

use crate::errors::Result;
use crate::pipeline::{map_files, SourceFile, Stage, StageFuture};

pub use parser::{parse, Node};

/// Check that a file parses; used by the built-in style linter.
pub fn check(file: &SourceFile) -> Result<()> {
    parse(file).map(|_| ())
}

/// Expand nested rules (`.x{.y{}}` to `.x .y{}`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CssNesting;

impl Stage for CssNesting {
    fn name(&self) -> &str {
        "css-nesting"
    }

    fn apply(&self, files: Vec<SourceFile>) -> StageFuture<'_> {
        Box::pin(async move {
            map_files(files, |file| {
                let nodes = nesting::flatten(parse(&file)?);
                Ok(file.with_lines(render::render_pretty(&nodes)))
            })
        })
    }
}

/// Add vendor-prefixed copies of declarations that need them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Autoprefix;

impl Stage for Autoprefix {
    fn name(&self) -> &str {
        "autoprefix"
    }

    fn apply(&self, files: Vec<SourceFile>) -> StageFuture<'_> {
        Box::pin(async move {
            map_files(files, |file| {
                let nodes = prefix::autoprefix(parse(&file)?);
                Ok(file.with_lines(render::render_pretty(&nodes)))
            })
        })
    }
}

/// Minify: drop comments and optional whitespace, one rule per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssCompress;

impl Stage for CssCompress {
    fn name(&self) -> &str {
        "css-compress"
    }

    fn apply(&self, files: Vec<SourceFile>) -> StageFuture<'_> {
        Box::pin(async move {
            map_files(files, |file| {
                let nodes = parse(&file)?;
                Ok(file.with_lines(render::render_compressed(&nodes)))
            })
        })
    }
}
