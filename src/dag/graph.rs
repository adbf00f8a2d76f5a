// src/dag/graph.rs

use std::collections::HashMap;

use crate::engine::TaskName;
use crate::pipeline::catalog::TaskDef;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    /// Direct dependencies: tasks that must succeed before this one can run.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskName>,
}

/// In-memory DAG keyed by task name.
///
/// Keeps adjacency for scheduling and dry-run output. The task catalog is
/// fixed and acyclic, so no cycle detection happens here.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: HashMap<TaskName, DagNode>,
    /// Task names in catalog order, for stable iteration.
    order: Vec<TaskName>,
}

impl DagGraph {
    /// Build a DAG from validated task definitions.
    ///
    /// Dependencies naming a task that is not in `defs` are dropped.
    pub fn from_defs(defs: &[TaskDef]) -> Self {
        let mut nodes: HashMap<TaskName, DagNode> = defs
            .iter()
            .map(|def| {
                (
                    def.name.clone(),
                    DagNode {
                        deps: Vec::new(),
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        for def in defs {
            for dep in &def.after {
                if !nodes.contains_key(dep) {
                    continue;
                }
                if let Some(node) = nodes.get_mut(&def.name) {
                    node.deps.push(dep.clone());
                }
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(def.name.clone());
                }
            }
        }

        Self {
            nodes,
            order: defs.iter().map(|d| d.name.clone()).collect(),
        }
    }

    /// All task names, in definition order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Tasks with no dependencies.
    pub fn roots(&self) -> Vec<TaskName> {
        self.tasks()
            .filter(|name| self.dependencies_of(name).is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Immediate dependencies of a task (the tasks listed in its `after`).
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task (tasks that list this one in their `after`).
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::catalog::task_catalog;

    #[test]
    fn clean_is_the_only_root() {
        let graph = DagGraph::from_defs(&task_catalog(&[]));
        assert_eq!(graph.roots(), vec!["clean".to_string()]);
        assert_eq!(graph.dependents_of("clean").len(), 6);
        assert_eq!(graph.dependencies_of("styles"), ["clean".to_string()]);
        assert!(graph.dependents_of("styles").is_empty());
    }

    #[test]
    fn iteration_follows_definition_order() {
        let graph = DagGraph::from_defs(&task_catalog(&["views".to_string()]));
        let names: Vec<_> = graph.tasks().collect();
        assert_eq!(
            names,
            vec!["clean", "styles", "scripts", "images", "fonts", "metadata"]
        );
    }
}
