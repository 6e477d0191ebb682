// src/config/mod.rs

//! Configuration loading and validation for sitedag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate names and patterns and produce a `BuildConfig` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{effective_env, load_and_validate, load_from_path, load_or_default, ENV_VAR};
pub use model::{BuildConfig, RawConfigFile};
