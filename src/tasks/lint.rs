// src/tasks/lint.rs

//! `eslint`, `stylelint` and their aggregate `lint`.
//!
//! With a configured command the tool runs through the shell with the
//! matched files appended, and every `file:line:col: message` line of its
//! output counts as a finding. Without one, built-in checks run instead.

use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use regex::Regex;
use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::dag::{action_fn, Task};
use crate::errors::{BuildError, Result};
use crate::exec::ShellCommand;
use crate::pattern::PatternSet;
use crate::pipeline::{css, js, SourceFile};
use crate::tasks::names;

const FINDING_PATTERN: &str = r"^(?P<file>[^:\s][^:]*):(?P<line>\d+):(?P<col>\d+):?\s*(?P<message>.*)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintKind {
    Scripts,
    Styles,
}

impl LintKind {
    pub fn tool(self) -> &'static str {
        match self {
            LintKind::Scripts => names::ESLINT,
            LintKind::Styles => names::STYLELINT,
        }
    }

    /// Configured patterns; build output is never linted.
    fn patterns(self, cfg: &BuildConfig) -> Vec<String> {
        let configured = match self {
            LintKind::Scripts => &cfg.lint.scripts,
            LintKind::Styles => &cfg.lint.styles,
        };
        let mut patterns = configured.clone();
        patterns.push(format!("!{}/**/*", cfg.build_dir.trim_end_matches('/')));
        patterns
    }

    fn command(self, cfg: &BuildConfig) -> Option<&str> {
        let cmd = match self {
            LintKind::Scripts => cfg.lint.eslint_cmd.as_deref(),
            LintKind::Styles => cfg.lint.stylelint_cmd.as_deref(),
        };
        cmd.filter(|c| !c.trim().is_empty())
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub file: String,
    pub line: Option<usize>,
    pub col: Option<usize>,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.col) {
            (Some(line), Some(col)) => write!(f, "{}:{line}:{col}: {}", self.file, self.message),
            _ => write!(f, "{}: {}", self.file, self.message),
        }
    }
}

pub fn eslint_task(cfg: Arc<BuildConfig>) -> Task {
    lint_kind_task(cfg, LintKind::Scripts)
}

pub fn stylelint_task(cfg: Arc<BuildConfig>) -> Task {
    lint_kind_task(cfg, LintKind::Styles)
}

pub fn lint_task() -> Task {
    Task::group(names::LINT, [names::ESLINT, names::STYLELINT])
}

fn lint_kind_task(cfg: Arc<BuildConfig>, kind: LintKind) -> Task {
    Task::new(kind.tool()).with_action(action_fn(move |_ctx| {
        let cfg = Arc::clone(&cfg);
        async move {
            let findings = lint(&cfg, kind).await?;
            report(&cfg, kind, &findings)
        }
    }))
}

/// Log findings; fail only when lint is configured as blocking.
fn report(cfg: &BuildConfig, kind: LintKind, findings: &[Finding]) -> Result<()> {
    for finding in findings {
        warn!(tool = kind.tool(), "{finding}");
    }
    if findings.is_empty() {
        info!(tool = kind.tool(), "no lint findings");
        return Ok(());
    }
    if cfg.lint.blocking {
        return Err(BuildError::LintFailed {
            tool: kind.tool().to_string(),
            findings: findings.len(),
        });
    }
    info!(tool = kind.tool(), findings = findings.len(), "lint finished with findings");
    Ok(())
}

/// Collect the lint file set and check it.
pub async fn lint(cfg: &BuildConfig, kind: LintKind) -> Result<Vec<Finding>> {
    let files = PatternSet::new(kind.patterns(cfg))?
        .resolve_async(&cfg.root)
        .await?;
    if files.is_empty() {
        info!(tool = kind.tool(), "no files to lint");
        return Ok(Vec::new());
    }
    let rels: Vec<String> = files.into_iter().map(|m| m.rel).collect();

    match kind.command(cfg) {
        Some(cmd) => run_external(cfg, kind, cmd, &rels).await,
        None => run_builtin(cfg, kind, &rels).await,
    }
}

async fn run_external(
    cfg: &BuildConfig,
    kind: LintKind,
    cmd: &str,
    files: &[String],
) -> Result<Vec<Finding>> {
    info!(tool = kind.tool(), files = files.len(), "running {cmd}");
    let output = ShellCommand::new(cmd)
        .args(files)
        .current_dir(&cfg.root)
        .output()
        .await?;

    let mut findings = parse_findings(&output.stdout)?;
    findings.extend(parse_findings(&output.stderr)?);

    if !output.success && findings.is_empty() {
        findings.push(Finding {
            file: kind.tool().to_string(),
            line: None,
            col: None,
            message: format!(
                "'{cmd}' exited with {}: {}",
                output.code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                output.stderr.trim()
            ),
        });
    }
    Ok(findings)
}

/// Parse `file:line:col: message` lines; other lines are ignored.
pub fn parse_findings(output: &str) -> Result<Vec<Finding>> {
    let re = Regex::new(FINDING_PATTERN).map_err(|e| BuildError::Other(e.into()))?;
    Ok(output
        .lines()
        .filter_map(|line| re.captures(line.trim()))
        .map(|caps| Finding {
            file: caps["file"].to_string(),
            line: caps["line"].parse().ok(),
            col: caps["col"].parse().ok(),
            message: caps["message"].trim().to_string(),
        })
        .collect())
}

async fn run_builtin(cfg: &BuildConfig, kind: LintKind, files: &[String]) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for rel in files {
        let path = cfg.resolve(rel);
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {path:?}"))?;

        match kind {
            LintKind::Styles => {
                if let Err(err) = css::check(&SourceFile::from_text(rel.clone(), &text)) {
                    let message = match err {
                        BuildError::Transform { message, .. } => message,
                        other => other.to_string(),
                    };
                    findings.push(Finding {
                        file: rel.clone(),
                        line: None,
                        col: None,
                        message,
                    });
                }
            }
            LintKind::Scripts => {
                findings.extend(js::check_balance(&text).into_iter().map(|issue| Finding {
                    file: rel.clone(),
                    line: Some(issue.line),
                    col: Some(issue.col),
                    message: issue.message,
                }));
            }
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfigFile;
    use std::path::PathBuf;

    #[test]
    fn build_dir_is_excluded_from_lint() {
        let mut raw = RawConfigFile::default();
        raw.build.dir = "public/".to_string();
        let cfg = BuildConfig::from_raw(raw, PathBuf::from("/site")).unwrap();

        let scripts = PatternSet::new(LintKind::Scripts.patterns(&cfg)).unwrap();
        assert!(scripts.matches("src/scripts/app.js"));
        assert!(!scripts.matches("public/index.min.js"));
        assert!(!scripts.matches("node_modules/x/index.js"));
        assert!(scripts.matches("static/legacy.js"));

        let styles = PatternSet::new(LintKind::Styles.patterns(&cfg)).unwrap();
        assert!(!styles.matches("public/index.min.css"));
    }

    #[test]
    fn parses_unix_formatted_output() {
        let out = "src/scripts/app.js:3:7: 'x' is not defined [no-undef]\n\n3 problems\n";
        let findings = parse_findings(out).unwrap();
        assert_eq!(
            findings,
            vec![Finding {
                file: "src/scripts/app.js".into(),
                line: Some(3),
                col: Some(7),
                message: "'x' is not defined [no-undef]".into(),
            }]
        );
        assert_eq!(findings[0].to_string(), "src/scripts/app.js:3:7: 'x' is not defined [no-undef]");
    }
}
