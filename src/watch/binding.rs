// src/watch/binding.rs

use std::fmt;
use std::sync::Arc;

use crate::engine::TaskName;
use crate::errors::Result;
use crate::pattern::PatternSet;

/// Callback invoked with the root-relative path that changed.
pub type WatchCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// What a binding does when one of its files changes.
#[derive(Clone)]
pub enum WatchHandler {
    /// Re-run a registered task through the trigger runtime.
    Task(TaskName),
    Callback(WatchCallback),
}

impl WatchHandler {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        WatchHandler::Callback(Arc::new(f))
    }
}

impl fmt::Debug for WatchHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchHandler::Task(name) => f.debug_tuple("Task").field(name).finish(),
            WatchHandler::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// A pattern set plus its handler.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    /// Label used in logs and as the hash key (`styles`, `reload`, ...).
    pub label: String,
    pub patterns: PatternSet,
    pub handler: WatchHandler,
    /// Fire only when the aggregated content of the matched files changed.
    pub use_hash: bool,
}

impl WatchBinding {
    pub fn matches(&self, rel_path: &str) -> bool {
        self.patterns.matches(rel_path)
    }
}

/// Bindings collected before the watcher starts.
#[derive(Debug, Clone, Default)]
pub struct WatchSet {
    bindings: Vec<WatchBinding>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `patterns` to `handler`. The label defaults to the task name for
    /// task handlers and to `callback` otherwise.
    pub fn watch<I, S>(&mut self, patterns: I, handler: WatchHandler) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let label = match &handler {
            WatchHandler::Task(name) => name.clone(),
            WatchHandler::Callback(_) => "callback".to_string(),
        };
        self.bind(label, patterns, handler, false)
    }

    /// Full form of [`watch`](Self::watch).
    pub fn bind<I, S>(
        &mut self,
        label: impl Into<String>,
        patterns: I,
        handler: WatchHandler,
        use_hash: bool,
    ) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.bindings.push(WatchBinding {
            label: label.into(),
            patterns: PatternSet::new(patterns)?,
            handler,
            use_hash,
        });
        Ok(self)
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_handlers() {
        let mut set = WatchSet::new();
        set.watch(["src/styles/**/*.css"], WatchHandler::Task("styles".into()))
            .unwrap()
            .watch(["static/**/*"], WatchHandler::callback(|_| {}))
            .unwrap();

        let labels: Vec<_> = set.bindings().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["styles", "callback"]);
        assert!(set.bindings()[0].matches("src/styles/a/b.css"));
        assert!(!set.bindings()[0].matches("src/scripts/a.js"));
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let mut set = WatchSet::new();
        assert!(set.watch(["src/[x"], WatchHandler::Task("x".into())).is_err());
        assert!(set.is_empty());
    }
}
