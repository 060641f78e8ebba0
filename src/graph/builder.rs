use std::collections::{HashMap, HashSet};

use crate::error::{EngineError, Result};
use crate::graph::cycle;
use crate::models::{Dependency, Task};

/// Validated, index-addressed dependency graph for one project.
///
/// Task ids are sorted lexically and index order follows that sort, so any
/// traversal that breaks ties by index also breaks them by id.
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    ids: Vec<String>,
    successors: Vec<Vec<(usize, i64)>>,
    predecessors: Vec<Vec<(usize, i64)>>,
}

impl ProjectGraph {
    /// Build and validate the graph. Checks run in this order: task scope,
    /// edge shape (self-loop, dangling, duplicate, lag bound), then cycles.
    pub fn build(
        project_id: &str,
        tasks: &[Task],
        edges: &[Dependency],
        max_lag_minutes: i64,
    ) -> Result<Self> {
        let mut ids: Vec<String> = Vec::with_capacity(tasks.len());
        for task in tasks {
            if task.project_id != project_id {
                return Err(EngineError::ScopeMismatch {
                    entity: "task",
                    id: task.id.clone(),
                    project_id: project_id.to_string(),
                });
            }
            ids.push(task.id.clone());
        }
        ids.sort_unstable();
        if let Some(dup) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(EngineError::validation(format!("Duplicate task id: {}", dup[0])));
        }

        let index: HashMap<String, usize> =
            ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
        let mut successors = vec![Vec::new(); ids.len()];
        let mut predecessors = vec![Vec::new(); ids.len()];
        let mut seen: HashSet<(usize, usize)> = HashSet::with_capacity(edges.len());

        for edge in edges {
            if edge.predecessor_id == edge.successor_id {
                return Err(EngineError::SelfLoop(edge.predecessor_id.clone()));
            }
            let lookup = |id: &str| {
                index.get(id).copied().ok_or_else(|| EngineError::DanglingEdge {
                    predecessor: edge.predecessor_id.clone(),
                    successor: edge.successor_id.clone(),
                    missing: id.to_string(),
                })
            };
            let from = lookup(&edge.predecessor_id)?;
            let to = lookup(&edge.successor_id)?;
            if !seen.insert((from, to)) {
                return Err(EngineError::DuplicateEdge {
                    predecessor: edge.predecessor_id.clone(),
                    successor: edge.successor_id.clone(),
                });
            }
            if edge.lag_minutes.abs() > max_lag_minutes {
                return Err(EngineError::LagOutOfRange {
                    predecessor: edge.predecessor_id.clone(),
                    successor: edge.successor_id.clone(),
                    lag_minutes: edge.lag_minutes,
                    limit: max_lag_minutes,
                });
            }
            successors[from].push((to, edge.lag_minutes));
            predecessors[to].push((from, edge.lag_minutes));
        }
        for list in successors.iter_mut().chain(predecessors.iter_mut()) {
            list.sort_unstable();
        }

        let graph = Self {
            ids,
            successors,
            predecessors,
        };
        graph.ensure_acyclic()?;
        Ok(graph)
    }

    fn ensure_acyclic(&self) -> Result<()> {
        let adjacency: Vec<Vec<usize>> = self
            .successors
            .iter()
            .map(|list| list.iter().map(|&(to, _)| to).collect())
            .collect();
        match cycle::find_cycle_indexed(&adjacency) {
            Some(found) => Err(EngineError::CycleDetected {
                cycle: found.into_iter().map(|i| self.ids[i].clone()).collect(),
            }),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    /// `(successor, lag_minutes)` pairs.
    pub fn successors(&self, index: usize) -> &[(usize, i64)] {
        &self.successors[index]
    }

    /// `(predecessor, lag_minutes)` pairs.
    pub fn predecessors(&self, index: usize) -> &[(usize, i64)] {
        &self.predecessors[index]
    }

    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }
}
