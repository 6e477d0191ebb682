// src/exec/command.rs

//! Shell command runner used by the transpile stage and the external
//! linters.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::Result;

/// A shell command line plus extra arguments and optional stdin.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    cmd: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    stdin: Option<Vec<u8>>,
}

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ShellCommand {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            args: Vec::new(),
            cwd: None,
            stdin: None,
        }
    }

    /// Append arguments after the command line (passed as `"$@"`, so they
    /// are never re-split by the shell).
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn command_line(&self) -> &str {
        &self.cmd
    }

    fn build(&self) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd).args(&self.args);
            c
        } else {
            let mut c = Command::new("sh");
            if self.args.is_empty() {
                c.arg("-c").arg(&self.cmd);
            } else {
                c.arg("-c")
                    .arg(format!("{} \"$@\"", self.cmd))
                    .arg("sh")
                    .args(&self.args);
            }
            c
        };

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.stdin(if self.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
        cmd
    }

    /// Run to completion and capture stdout and stderr.
    ///
    /// A non-zero exit is not an error here; callers decide what it means.
    pub async fn output(&self) -> Result<CommandOutput> {
        info!(cmd = %self.cmd, args = self.args.len(), "running command");

        let mut child = self
            .build()
            .spawn()
            .with_context(|| format!("spawning '{}'", self.cmd))?;

        // Feed stdin from a separate task so a chatty child cannot deadlock
        // against a full stdout pipe.
        let writer = match (child.stdin.take(), self.stdin.clone()) {
            (Some(mut pipe), Some(input)) => Some(tokio::spawn(async move {
                let res = pipe.write_all(&input).await;
                drop(pipe);
                res
            })),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("waiting for '{}'", self.cmd))?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(cmd = %self.cmd, error = %e, "writing stdin failed"),
                Err(e) => warn!(cmd = %self.cmd, error = %e, "stdin writer aborted"),
            }
        }

        let result = CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            cmd = %self.cmd,
            exit_code = ?result.code,
            success = result.success,
            "command exited"
        );
        Ok(result)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pipes_stdin_to_stdout() {
        let out = ShellCommand::new("tr a-z A-Z")
            .stdin("hello\n")
            .output()
            .await
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout, "HELLO\n");
    }

    #[tokio::test]
    async fn appended_args_are_not_resplit() {
        let out = ShellCommand::new("printf '%s|'")
            .args(["a b", "c"])
            .output()
            .await
            .unwrap();
        assert_eq!(out.stdout, "a b|c|");
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_not_raised() {
        let out = ShellCommand::new("echo oops >&2; exit 3")
            .output()
            .await
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stderr.trim(), "oops");
    }
}
