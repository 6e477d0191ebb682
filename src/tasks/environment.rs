// src/tasks/environment.rs

use crate::dag::Task;
use crate::tasks::names;
use crate::types::Environment;

/// Tasks making up `default` for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskSet {
    tasks: Vec<&'static str>,
}

impl TaskSet {
    pub fn tasks(&self) -> &[&'static str] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains(&name)
    }

    /// The aggregate `default` task, or `None` for an empty set.
    pub fn default_task(&self) -> Option<Task> {
        if self.is_empty() {
            None
        } else {
            Some(Task::group(names::DEFAULT, self.tasks.iter().copied()))
        }
    }
}

/// Map the environment to the `default` task set. Evaluated once, at
/// registration.
pub fn select_environment(env: &Environment) -> TaskSet {
    let tasks = match env {
        Environment::Development => vec![
            names::FONTS,
            names::SCRIPTS,
            names::STYLES,
            names::COMPILE,
            names::WATCH,
            names::DEV_SERVER,
        ],
        Environment::Production => {
            vec![names::FONTS, names::SCRIPTS, names::STYLES, names::COMPILE]
        }
        Environment::Other(_) => Vec::new(),
    };
    TaskSet { tasks }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_adds_watch_and_server() {
        let set = select_environment(&Environment::Development);
        assert_eq!(
            set.tasks(),
            &["fonts", "scripts", "styles", "compile", "watch", "dev-server"]
        );
        let default = set.default_task().unwrap();
        assert_eq!(default.name, "default");
        assert!(default.action.is_none());
    }

    #[test]
    fn production_is_build_only() {
        let set = select_environment(&Environment::Production);
        assert!(!set.contains(names::WATCH));
        assert!(!set.contains(names::DEV_SERVER));
        assert_eq!(set.tasks().len(), 4);
    }

    #[test]
    fn unknown_environment_registers_nothing() {
        let set = select_environment(&Environment::Other("staging".into()));
        assert!(set.is_empty());
        assert!(set.default_task().is_none());
    }
}
