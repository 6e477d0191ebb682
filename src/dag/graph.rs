// src/dag/graph.rs

use std::collections::HashMap;

use crate::dag::registry::ExecutionPlan;
use crate::engine::TaskName;

#[derive(Debug, Clone, Default)]
struct DagNode {
    deps: Vec<TaskName>,
    dependents: Vec<TaskName>,
}

/// Adjacency view of one execution plan.
///
/// Acyclicity is established by `TaskRegistry::resolve`; this only keeps
/// the edges the scheduler walks in both directions.
#[derive(Debug, Clone)]
pub struct DagGraph {
    order: Vec<TaskName>,
    nodes: HashMap<TaskName, DagNode>,
}

impl DagGraph {
    pub fn from_plan(plan: &ExecutionPlan) -> Self {
        let mut nodes: HashMap<TaskName, DagNode> = plan
            .order
            .iter()
            .map(|name| {
                let deps = plan
                    .tasks
                    .get(name)
                    .map(|t| t.deps.clone())
                    .unwrap_or_default();
                (
                    name.clone(),
                    DagNode {
                        deps,
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        for name in &plan.order {
            let deps = nodes
                .get(name)
                .map(|n| n.deps.clone())
                .unwrap_or_default();
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    if !dep_node.dependents.contains(name) {
                        dep_node.dependents.push(name.clone());
                    }
                }
            }
        }

        Self {
            order: plan.order.clone(),
            nodes,
        }
    }

    /// Task names, dependencies first.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
