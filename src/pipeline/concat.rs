// src/pipeline/concat.rs

use crate::pipeline::{SourceFile, Stage, StageFuture};

/// Join every file of the batch, in input order, into one file.
///
/// An empty batch stays empty, so nothing gets written downstream.
#[derive(Debug, Clone)]
pub struct Concat {
    file_name: String,
}

impl Concat {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn join(&self, files: Vec<SourceFile>) -> Option<SourceFile> {
        if files.is_empty() {
            return None;
        }

        let mut out = SourceFile {
            path: self.file_name.clone(),
            lines: Vec::new(),
            sources: Vec::new(),
        };
        for file in files {
            out.lines.extend(file.lines);
            for src in file.sources {
                if !out.sources.iter().any(|s| s.name == src.name) {
                    out.sources.push(src);
                }
            }
        }
        Some(out)
    }
}

impl Stage for Concat {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(&self, files: Vec<SourceFile>) -> StageFuture<'_> {
        Box::pin(async move { Ok(self.join(files).into_iter().collect()) })
    }
}
