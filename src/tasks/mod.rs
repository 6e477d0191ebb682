// src/tasks/mod.rs

//! Built-in site tasks and their registration.

pub mod compile;
pub mod copy;
pub mod environment;
pub mod lint;
pub mod scripts;
pub mod serve;
pub mod styles;
pub mod watch;

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::dag::TaskRegistry;

pub use environment::{select_environment, TaskSet};

/// Task names understood on the command line.
pub mod names {
    pub const DEFAULT: &str = "default";
    pub const FONTS: &str = "fonts";
    pub const ASSETS: &str = "assets";
    pub const STYLES: &str = "styles";
    pub const SCRIPTS: &str = "scripts";
    pub const COMPILE: &str = "compile";
    pub const ESLINT: &str = "eslint";
    pub const STYLELINT: &str = "stylelint";
    pub const LINT: &str = "lint";
    pub const WATCH: &str = "watch";
    pub const DEV_SERVER: &str = "dev-server";
}

/// Register every built-in task, plus `default` when the configured
/// environment selects one.
pub fn register_builtin_tasks(registry: &mut TaskRegistry, cfg: Arc<BuildConfig>) {
    registry.register(copy::fonts_task(Arc::clone(&cfg)));
    registry.register(copy::assets_task(Arc::clone(&cfg)));
    registry.register(styles::task(Arc::clone(&cfg)));
    registry.register(scripts::task(Arc::clone(&cfg)));
    registry.register(compile::task(Arc::clone(&cfg)));
    registry.register(lint::eslint_task(Arc::clone(&cfg)));
    registry.register(lint::stylelint_task(Arc::clone(&cfg)));
    registry.register(lint::lint_task());
    registry.register(watch::task(Arc::clone(&cfg)));
    registry.register(serve::task(Arc::clone(&cfg)));

    match select_environment(&cfg.env).default_task() {
        Some(default) => {
            debug!(env = %cfg.env, deps = ?default.deps, "registering default task");
            registry.register(default);
        }
        None => info!(env = %cfg.env, "environment selects no default task"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfigFile;
    use crate::errors::BuildError;
    use crate::types::Environment;
    use std::path::PathBuf;

    fn registry_for(env: Environment) -> TaskRegistry {
        let cfg = BuildConfig::from_raw(RawConfigFile::default(), PathBuf::from("/site"))
            .unwrap()
            .with_env(env);
        let mut registry = TaskRegistry::new();
        register_builtin_tasks(&mut registry, Arc::new(cfg));
        registry
    }

    #[test]
    fn builtin_graph_is_valid() {
        let registry = registry_for(Environment::Development);
        registry.validate().unwrap();
        let plan = registry.resolve(&[names::LINT]).unwrap();
        assert_eq!(plan.order.last().map(String::as_str), Some("lint"));
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn other_environment_has_no_default() {
        let registry = registry_for(Environment::Other("qa".into()));
        assert!(!registry.contains(names::DEFAULT));
        assert!(matches!(
            registry.resolve(&[names::DEFAULT]),
            Err(BuildError::UnknownTask { .. })
        ));
    }
}
