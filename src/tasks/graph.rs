//! Task dependency graph: validation and topological ordering.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::manifest::Task;
use crate::error::GraphError;

/// Read-only dependency graph over the OS-filtered task set for one run.
///
/// Construction validates the graph (missing dependency references and
/// cycles); a `TaskGraph` is therefore only ever observable in a valid state.
/// The execution engine re-derives readiness dynamically from live task
/// status — [`topological`](TaskGraph::topological) is an advisory view for
/// inspection only.
#[derive(Debug)]
pub struct TaskGraph<'a> {
    tasks: HashMap<&'a str, &'a Task>,
    /// Task ids in document order, for deterministic iteration.
    order: Vec<&'a str>,
}

impl<'a> TaskGraph<'a> {
    /// Build and validate a graph from the filtered task list.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MissingDependency`] when a task references an id
    /// absent from the set (fails on first encounter, depth-first), or
    /// [`GraphError::Cycle`] naming the node at which a cycle closed.
    pub fn new(tasks: &[&'a Task]) -> Result<Self, GraphError> {
        let graph = Self {
            tasks: tasks.iter().map(|t| (t.id.as_str(), *t)).collect(),
            order: tasks.iter().map(|t| t.id.as_str()).collect(),
        };
        graph.check_cycles()?;
        Ok(graph)
    }

    /// Depth-first validation with a recursion-stack set.
    ///
    /// Fully explored nodes are marked visited and never re-traversed, so the
    /// walk is linear in nodes plus edges.
    fn check_cycles(&self) -> Result<(), GraphError> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: HashSet<&str> = HashSet::new();
        for &node in &self.order {
            self.visit(node, &mut visited, &mut stack)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        stack: &mut HashSet<&'a str>,
    ) -> Result<(), GraphError> {
        if stack.contains(node) {
            return Err(GraphError::Cycle(node.to_string()));
        }
        if visited.contains(node) {
            return Ok(());
        }
        stack.insert(node);
        for dep in self.deps_of(node) {
            if !self.tasks.contains_key(dep.as_str()) {
                return Err(GraphError::MissingDependency {
                    task: node.to_string(),
                    dependency: dep.clone(),
                });
            }
            self.visit(dep, visited, stack)?;
        }
        stack.remove(node);
        visited.insert(node);
        Ok(())
    }

    /// Dependency ids declared by `node`, or an empty slice for unknown ids.
    #[must_use]
    pub fn deps_of(&self, node: &str) -> &'a [String] {
        self.tasks.get(node).map_or(&[], |t| t.deps.as_slice())
    }

    /// Task ids in document order.
    #[must_use]
    pub fn nodes(&self) -> &[&'a str] {
        &self.order
    }

    /// Number of tasks in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the graph contains no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Compute a dependency-respecting ordering with Kahn's algorithm.
    ///
    /// For every edge task → dependency, the dependency appears *before* the
    /// task in the returned order. Ties resolve in document order, so the
    /// output is deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ResidualCycle`] if the emitted order is shorter
    /// than the node count — a cycle that survived the construction-time DFS
    /// check, which should not occur.
    pub fn topological(&self) -> Result<Vec<&'a str>, GraphError> {
        let mut in_deg: HashMap<&str, usize> = self
            .order
            .iter()
            .map(|&id| (id, self.deps_of(id).len()))
            .collect();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for &id in &self.order {
            for dep in self.deps_of(id) {
                dependents.entry(dep.as_str()).or_default().push(id);
            }
        }

        let mut queue: VecDeque<&str> = self
            .order
            .iter()
            .filter(|&&id| in_deg.get(id).copied() == Some(0))
            .copied()
            .collect();
        let mut sorted: Vec<&str> = Vec::with_capacity(self.order.len());

        while let Some(node) = queue.pop_front() {
            sorted.push(node);
            if let Some(deps) = dependents.get(node) {
                for &dependent in deps {
                    if let Some(count) = in_deg.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            queue.push_back(dependent);
                        }
                    }
                }
            }
        }

        if sorted.len() != self.order.len() {
            return Err(GraphError::ResidualCycle);
        }
        Ok(sorted)
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::manifest::OsMapping;

    fn task(id: &str, deps: &[&str]) -> Task {
        Task {
            id: id.to_string(),
            name: id.to_uppercase(),
            kind: "package".to_string(),
            deps: deps.iter().map(ToString::to_string).collect(),
            exit_on_failure: false,
            windows: None,
            mac: None,
            linux: Some(OsMapping {
                apt: Some(id.to_string()),
                ..OsMapping::default()
            }),
        }
    }

    fn graph<'a>(tasks: &[&'a Task]) -> Result<TaskGraph<'a>, GraphError> {
        TaskGraph::new(tasks)
    }

    #[test]
    fn independent_tasks_are_valid() {
        let (a, b, c) = (task("a", &[]), task("b", &[]), task("c", &[]));
        let g = graph(&[&a, &b, &c]).unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.nodes(), &["a", "b", "c"]);
    }

    #[test]
    fn linear_chain_is_valid() {
        let (a, b, c) = (task("a", &[]), task("b", &["a"]), task("c", &["b"]));
        assert!(graph(&[&a, &b, &c]).is_ok());
    }

    #[test]
    fn diamond_is_valid() {
        let a = task("a", &[]);
        let b = task("b", &["a"]);
        let c = task("c", &["a"]);
        let d = task("d", &["b", "c"]);
        assert!(graph(&[&a, &b, &c, &d]).is_ok());
    }

    #[test]
    fn two_node_cycle_is_rejected() {
        let a = task("a", &["b"]);
        let b = task("b", &["a"]);
        let err = graph(&[&a, &b]).unwrap_err();
        assert!(matches!(err, GraphError::Cycle(node) if node == "a" || node == "b"));
    }

    #[test]
    fn self_cycle_is_rejected() {
        let a = task("a", &["a"]);
        let err = graph(&[&a]).unwrap_err();
        assert!(matches!(err, GraphError::Cycle(node) if node == "a"));
    }

    #[test]
    fn missing_dependency_is_rejected() {
        let a = task("a", &["ghost"]);
        let b = task("b", &[]);
        let err = graph(&[&a, &b]).unwrap_err();
        match err {
            GraphError::MissingDependency { task, dependency } => {
                assert_eq!(task, "a");
                assert_eq!(dependency, "ghost");
            }
            other => panic!("expected MissingDependency, got {other}"),
        }
    }

    #[test]
    fn topological_orders_dependencies_first() {
        let a = task("a", &[]);
        let b = task("b", &["a"]);
        let c = task("c", &["a"]);
        let d = task("d", &["b", "c"]);
        let g = graph(&[&d, &c, &b, &a]).unwrap();
        let order = g.topological().unwrap();

        assert_eq!(order.len(), 4);
        let pos = |id: &str| order.iter().position(|&n| n == id).unwrap();
        for (node, dep) in [("b", "a"), ("c", "a"), ("d", "b"), ("d", "c")] {
            assert!(
                pos(dep) < pos(node),
                "dependency '{dep}' must precede '{node}' in {order:?}"
            );
        }
    }

    #[test]
    fn topological_is_a_permutation_of_all_ids() {
        let a = task("a", &[]);
        let b = task("b", &["a"]);
        let c = task("c", &[]);
        let g = graph(&[&a, &b, &c]).unwrap();
        let mut order = g.topological().unwrap();
        order.sort_unstable();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn topological_ties_resolve_in_document_order() {
        let (a, b, c) = (task("a", &[]), task("b", &[]), task("c", &[]));
        let g = graph(&[&c, &a, &b]).unwrap();
        assert_eq!(g.topological().unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn deps_of_unknown_node_is_empty() {
        let a = task("a", &[]);
        let g = graph(&[&a]).unwrap();
        assert!(g.deps_of("ghost").is_empty());
    }

    #[test]
    fn empty_graph_is_valid() {
        let g = graph(&[]).unwrap();
        assert!(g.is_empty());
        assert!(g.topological().unwrap().is_empty());
    }
}
