// src/dag/registry.rs

//! Task registry: named tasks, their dependency lists and actions.
//!
//! The registry is a plain value owned by whoever builds it. Nothing is
//! registered globally, so tests can build as many independent graphs as
//! they like in one process.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::engine::{TaskContext, TaskName};
use crate::errors::{BuildError, Result};

/// Future returned by a task action.
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// The executable body of a task.
///
/// Every action hands its work back to the executor as a future; the task
/// counts as complete only when that future resolves. There is no
/// fire-and-forget variant.
pub trait TaskAction: Send + Sync {
    fn execute(&self, ctx: TaskContext) -> TaskFuture<'_>;
}

impl fmt::Debug for dyn TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TaskAction")
    }
}

/// Adapter turning an async closure into a [`TaskAction`].
struct FnAction<F>(F);

impl<F, Fut> TaskAction for FnAction<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn execute(&self, ctx: TaskContext) -> TaskFuture<'_> {
        Box::pin((self.0)(ctx))
    }
}

/// Wrap an async closure as a shareable task action.
pub fn action_fn<F, Fut>(f: F) -> Arc<dyn TaskAction>
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(FnAction(f))
}

/// A named unit of build work.
///
/// A task without an action only aggregates its dependencies and completes
/// as soon as they have.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: TaskName,
    pub deps: Vec<TaskName>,
    pub action: Option<Arc<dyn TaskAction>>,
}

impl Task {
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self {
            name: name.into(),
            deps: Vec::new(),
            action: None,
        }
    }

    /// Aggregator task that only depends on `deps`.
    pub fn group<I, S>(name: impl Into<TaskName>, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self::new(name).after(deps)
    }

    pub fn after<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_action(mut self, action: Arc<dyn TaskAction>) -> Self {
        self.action = Some(action);
        self
    }
}

/// Resolved subgraph for one run: every task reachable from the requested
/// roots, in an order where dependencies come first.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub order: Vec<TaskName>,
    pub tasks: HashMap<TaskName, Task>,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a task. A task already registered under the same name is
    /// replaced (last write wins) and returned.
    pub fn register(&mut self, task: Task) -> Option<Task> {
        let name = task.name.clone();
        let previous = self.tasks.insert(name.clone(), task);
        if previous.is_some() {
            warn!(task = %name, "task registered twice; previous definition replaced");
        } else {
            debug!(task = %name, "registered task");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Result<&Task> {
        self.tasks
            .get(name)
            .ok_or_else(|| BuildError::unknown_task(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Check the whole registry: every dependency names a registered task
    /// and the graph has no cycle.
    pub fn validate(&self) -> Result<()> {
        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in self.tasks.keys() {
            graph.add_node(name.as_str());
        }

        for (name, task) in self.tasks.iter() {
            for dep in task.deps.iter() {
                if !self.tasks.contains_key(dep) {
                    return Err(BuildError::UnknownTask {
                        name: dep.clone(),
                        referenced_by: Some(name.clone()),
                    });
                }
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => {
                let node = cycle.node_id().to_string();
                // Re-resolve from the offending node to report the full path.
                match self.resolve(&[node.as_str()]) {
                    Err(err @ BuildError::CyclicDependency { .. }) => Err(err),
                    _ => Err(BuildError::CyclicDependency {
                        cycle: vec![node.clone(), node],
                    }),
                }
            }
        }
    }

    /// Resolve the transitive dependencies of `roots` by depth-first search.
    ///
    /// A node reached again while still in progress is a cycle; the error
    /// lists the path from the first occurrence back to itself.
    pub fn resolve<S: AsRef<str>>(&self, roots: &[S]) -> Result<ExecutionPlan> {
        let mut marks: HashMap<TaskName, Mark> = HashMap::new();
        let mut path: Vec<TaskName> = Vec::new();
        let mut order: Vec<TaskName> = Vec::new();

        for root in roots {
            self.visit(root.as_ref(), None, &mut marks, &mut path, &mut order)?;
        }

        let tasks = order
            .iter()
            .filter_map(|name| self.tasks.get(name).map(|t| (name.clone(), t.clone())))
            .collect();

        debug!(?order, "resolved execution plan");
        Ok(ExecutionPlan { order, tasks })
    }

    fn visit(
        &self,
        name: &str,
        parent: Option<&str>,
        marks: &mut HashMap<TaskName, Mark>,
        path: &mut Vec<TaskName>,
        order: &mut Vec<TaskName>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                let start = path.iter().position(|n| n == name).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(name.to_string());
                return Err(BuildError::CyclicDependency { cycle });
            }
            None => {}
        }

        let task = self.tasks.get(name).ok_or_else(|| BuildError::UnknownTask {
            name: name.to_string(),
            referenced_by: parent.map(str::to_string),
        })?;

        marks.insert(name.to_string(), Mark::InProgress);
        path.push(name.to_string());

        for dep in &task.deps {
            self.visit(dep, Some(name), marks, path, order)?;
        }

        path.pop();
        marks.insert(name.to_string(), Mark::Done);
        order.push(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(edges: &[(&str, &[&str])]) -> TaskRegistry {
        let mut reg = TaskRegistry::new();
        for (name, deps) in edges {
            reg.register(Task::group(*name, deps.iter().copied()));
        }
        reg
    }

    #[test]
    fn resolve_orders_dependencies_first_and_once() {
        let reg = registry(&[
            ("a", &["b", "c"]),
            ("b", &["d"]),
            ("c", &["d"]),
            ("d", &[]),
        ]);
        let plan = reg.resolve(&["a"]).unwrap();
        assert_eq!(plan.order, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn resolve_names_the_cycle() {
        let reg = registry(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        match reg.resolve(&["a"]).unwrap_err() {
            BuildError::CyclicDependency { cycle } => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn resolve_reports_unknown_dependency_with_parent() {
        let reg = registry(&[("a", &["ghost"])]);
        match reg.resolve(&["a"]).unwrap_err() {
            BuildError::UnknownTask { name, referenced_by } => {
                assert_eq!(name, "ghost");
                assert_eq!(referenced_by.as_deref(), Some("a"));
            }
            other => panic!("expected unknown task, got {other:?}"),
        }
    }

    #[test]
    fn validate_catches_cycles_not_reachable_from_any_root() {
        let reg = registry(&[("x", &[]), ("a", &["b"]), ("b", &["a"])]);
        assert!(matches!(
            reg.validate(),
            Err(BuildError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn validate_catches_self_dependency() {
        let reg = registry(&[("a", &["a"])]);
        match reg.validate().unwrap_err() {
            BuildError::CyclicDependency { cycle } => assert_eq!(cycle, vec!["a", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn register_last_write_wins() {
        let mut reg = TaskRegistry::new();
        assert!(reg.register(Task::group("a", ["b"])).is_none());
        let previous = reg.register(Task::new("a"));
        assert_eq!(previous.map(|t| t.deps), Some(vec!["b".to_string()]));
        assert!(reg.get("a").unwrap().deps.is_empty());
        assert!(matches!(
            reg.get("nope"),
            Err(BuildError::UnknownTask { .. })
        ));
    }
}
