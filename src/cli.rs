// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `sitedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitedag",
    version,
    about = "Build a static site from templates, styles and scripts.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run (fonts, scripts, styles, compile, assets, lint, eslint,
    /// stylelint, watch, dev-server). Runs `default` when empty.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// When omitted, `Sitedag.toml` in the current directory is used if it
    /// exists, otherwise built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Build environment (development, production, ...).
    ///
    /// Overrides `SITEDAG_ENV` and `[build].env`.
    #[arg(long, value_name = "ENV")]
    pub env: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate, print tasks, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tasks_and_flags() {
        let args = CliArgs::parse_from([
            "sitedag",
            "styles",
            "scripts",
            "--env",
            "production",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.tasks, vec!["styles", "scripts"]);
        assert_eq!(args.env.as_deref(), Some("production"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(!args.dry_run);
        assert!(args.config.is_none());
    }
}
