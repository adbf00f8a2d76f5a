// src/pipeline/catalog.rs

//! The fixed task graph: `clean` first, then every enabled asset task.

use crate::engine::TaskName;
use crate::pipeline::{AssetKind, TaskKind};

pub const CLEAN_TASK: &str = "clean";

/// A node of the task graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDef {
    pub name: TaskName,
    pub kind: TaskKind,
    /// Tasks that must succeed before this one runs.
    pub after: Vec<TaskName>,
    /// Recursive glob (relative to the source root) that retriggers the task.
    pub watch: Option<String>,
}

impl TaskDef {
    pub fn clean() -> Self {
        Self {
            name: CLEAN_TASK.to_string(),
            kind: TaskKind::Clean,
            after: Vec::new(),
            watch: None,
        }
    }

    pub fn asset(kind: AssetKind) -> Self {
        Self {
            name: kind.name().to_string(),
            kind: TaskKind::Asset(kind),
            after: vec![CLEAN_TASK.to_string()],
            watch: Some(kind.watch_glob()),
        }
    }
}

/// Every task name a config may refer to.
pub fn known_task_names() -> Vec<&'static str> {
    std::iter::once(CLEAN_TASK)
        .chain(AssetKind::ALL.iter().map(|k| k.name()))
        .collect()
}

/// Build the task graph, leaving out the `disabled` asset tasks.
pub fn task_catalog(disabled: &[String]) -> Vec<TaskDef> {
    std::iter::once(TaskDef::clean())
        .chain(
            AssetKind::ALL
                .into_iter()
                .filter(|kind| !disabled.iter().any(|d| d == kind.name()))
                .map(TaskDef::asset),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_asset_task_runs_after_clean() {
        let defs = task_catalog(&[]);
        assert_eq!(defs.len(), 7);
        assert_eq!(defs[0].name, CLEAN_TASK);
        assert!(defs[0].after.is_empty());

        for def in defs.iter().skip(1) {
            assert_eq!(def.after, vec![CLEAN_TASK.to_string()]);
            assert!(def.watch.is_some());
        }
    }

    #[test]
    fn disabled_tasks_are_left_out() {
        let defs = task_catalog(&["metadata".to_string(), "fonts".to_string()]);
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["clean", "views", "styles", "scripts", "images"]);
    }

    #[test]
    fn every_catalog_is_acyclic_with_clean_as_sole_root() {
        use crate::dag::DagGraph;
        use std::collections::HashMap;

        for mask in 0u32..(1 << AssetKind::ALL.len()) {
            let disabled: Vec<String> = AssetKind::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, k)| k.name().to_string())
                .collect();
            let defs = task_catalog(&disabled);

            for def in &defs {
                assert!(!def.after.contains(&def.name), "{} depends on itself", def.name);
                for dep in &def.after {
                    assert!(defs.iter().any(|d| &d.name == dep), "unknown dependency {dep}");
                }
            }

            let graph = DagGraph::from_defs(&defs);
            assert_eq!(graph.roots(), vec![CLEAN_TASK.to_string()]);

            // Kahn's algorithm visits every node only when there is no cycle.
            let mut indegree: HashMap<&str, usize> = graph
                .tasks()
                .map(|t| (t, graph.dependencies_of(t).len()))
                .collect();
            let mut ready: Vec<&str> = graph.tasks().filter(|t| indegree[t] == 0).collect();
            let mut visited = 0;
            while let Some(task) = ready.pop() {
                visited += 1;
                for next in graph.dependents_of(task) {
                    let Some(n) = indegree.get_mut(next.as_str()) else { continue };
                    *n -= 1;
                    if *n == 0 {
                        ready.push(next.as_str());
                    }
                }
            }
            assert_eq!(visited, defs.len(), "cycle with disabled = {disabled:?}");
        }
    }
}
