// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs external tools (`sh -c` on Unix, `cmd /C` on Windows) through
//! `tokio::process` and hands their captured output back to the caller.

pub mod command;

pub use command::{CommandOutput, ShellCommand};
