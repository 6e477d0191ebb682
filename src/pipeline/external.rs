// src/pipeline/external.rs

use std::path::PathBuf;

use tracing::debug;

use crate::errors::{BuildError, Result};
use crate::exec::ShellCommand;
use crate::pipeline::{Line, SourceFile, Stage, StageFuture};

/// Pipe each file through an external command (stdin to stdout).
///
/// Output line `i` keeps the origin of input line `i`, which is exact for
/// line-preserving tools and close enough for the rest. Without a command
/// the stage passes files through untouched.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    name: String,
    cmd: Option<String>,
    cwd: PathBuf,
}

impl ExternalCommand {
    pub fn new(name: impl Into<String>, cmd: Option<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.filter(|c| !c.trim().is_empty()),
            cwd: cwd.into(),
        }
    }

    async fn run_one(&self, cmd: &str, file: SourceFile) -> Result<SourceFile> {
        let output = ShellCommand::new(cmd)
            .current_dir(&self.cwd)
            .stdin(file.text())
            .output()
            .await?;

        if !output.success {
            return Err(BuildError::transform(
                &self.name,
                &file.path,
                format!(
                    "'{cmd}' exited with {}: {}",
                    output
                        .code
                        .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                    output.stderr.trim()
                ),
            ));
        }

        let lines = output
            .stdout
            .lines()
            .enumerate()
            .map(|(idx, text)| Line::new(text, file.origin_of(idx)))
            .collect();
        Ok(file.with_lines(lines))
    }
}

impl Stage for ExternalCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, files: Vec<SourceFile>) -> StageFuture<'_> {
        Box::pin(async move {
            let Some(cmd) = self.cmd.as_deref() else {
                debug!(stage = %self.name, "no command configured; passing through");
                return Ok(files);
            };

            let mut out = Vec::with_capacity(files.len());
            for file in files {
                out.push(self.run_one(cmd, file).await?);
            }
            Ok(out)
        })
    }
}
