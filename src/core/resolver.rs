//! # Dependency resolution over the declared service graph.
//!
//! Pure functions over a `HashMap<id, Vec<dependency id>>` view of the
//! registry. No side effects; safe to call repeatedly with partial graphs
//! (edges may point at ids that have no entry yet), which is how the
//! registry uses them at registration time and how operators can use them
//! for diagnostics.
//!
//! ## Contents
//! - [`check_acyclic`] — rejects graphs with a dependency cycle
//! - [`start_order`] — transitive dependencies of one id, dependencies
//!   before dependents
//! - [`shutdown_order`] — full reverse-topological order (dependents first)

use std::collections::HashMap;

use crate::error::SupervisorError;

/// Dependency graph view: id → declared dependency ids.
pub type Graph = HashMap<String, Vec<String>>;

const NO_DEPS: &[String] = &[];

fn deps_of<'g>(graph: &'g Graph, id: &str) -> &'g [String] {
    graph.get(id).map(Vec::as_slice).unwrap_or(NO_DEPS)
}

/// Verifies that the graph contains no dependency cycle.
///
/// Depth-first traversal from every node with a per-call "visiting" set; a
/// node revisited while still in flight signals a cycle. The error lists the
/// participating ids, sorted for stable messages.
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use servisor::resolver::check_acyclic;
///
/// let mut graph = HashMap::new();
/// graph.insert("api".to_string(), vec!["cache".to_string()]);
/// graph.insert("cache".to_string(), vec![]);
/// assert!(check_acyclic(&graph).is_ok());
/// ```
pub fn check_acyclic(graph: &Graph) -> Result<(), SupervisorError> {
    let mut state: HashMap<&str, Mark> = HashMap::with_capacity(graph.len());
    let mut path: Vec<&str> = Vec::new();

    for root in graph.keys() {
        visit_for_cycles(root, graph, &mut state, &mut path)?;
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

fn visit_for_cycles<'g>(
    node: &'g str,
    graph: &'g Graph,
    state: &mut HashMap<&'g str, Mark>,
    path: &mut Vec<&'g str>,
) -> Result<(), SupervisorError> {
    match state.get(node) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            // Everything from the first occurrence of `node` on the current
            // path participates in the cycle.
            let from = path.iter().position(|n| *n == node).unwrap_or(0);
            let mut cycle: Vec<String> = path[from..].iter().map(|n| n.to_string()).collect();
            cycle.sort_unstable();
            cycle.dedup();
            return Err(SupervisorError::CyclicDependency { cycle });
        }
        None => {}
    }

    state.insert(node, Mark::Visiting);
    path.push(node);
    for dep in deps_of(graph, node) {
        visit_for_cycles(dep, graph, state, path)?;
    }
    path.pop();
    state.insert(node, Mark::Done);
    Ok(())
}

/// Returns the transitive dependencies of `id` in start order: dependencies
/// before dependents, deduplicated, excluding `id` itself.
///
/// Every listed id must reach Running before `id` may start. The function
/// orders; it does not start anything. Ids referenced but absent from the
/// graph are included (the controller reports them as unknown when it tries
/// to start them).
pub fn start_order(id: &str, graph: &Graph) -> Result<Vec<String>, SupervisorError> {
    let mut state: HashMap<&str, Mark> = HashMap::new();
    let mut path: Vec<&str> = Vec::new();
    let mut order: Vec<String> = Vec::new();

    visit_for_order(id, graph, &mut state, &mut path, &mut order)?;
    order.pop(); // the root itself is not its own dependency
    Ok(order)
}

fn visit_for_order<'g>(
    node: &'g str,
    graph: &'g Graph,
    state: &mut HashMap<&'g str, Mark>,
    path: &mut Vec<&'g str>,
    order: &mut Vec<String>,
) -> Result<(), SupervisorError> {
    match state.get(node) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let from = path.iter().position(|n| *n == node).unwrap_or(0);
            let mut cycle: Vec<String> = path[from..].iter().map(|n| n.to_string()).collect();
            cycle.sort_unstable();
            cycle.dedup();
            return Err(SupervisorError::CyclicDependency { cycle });
        }
        None => {}
    }

    state.insert(node, Mark::Visiting);
    path.push(node);
    for dep in deps_of(graph, node) {
        visit_for_order(dep, graph, state, path, order)?;
    }
    path.pop();
    state.insert(node, Mark::Done);
    order.push(node.to_string());
    Ok(())
}

/// Returns every id in the graph in shutdown order: dependents before the
/// services they depend on.
///
/// Used for orderly teardown — reversing the full start order guarantees no
/// service is stopped while something depending on it is still running.
/// Roots are visited in sorted order so the result is deterministic.
pub fn shutdown_order(graph: &Graph) -> Result<Vec<String>, SupervisorError> {
    let mut state: HashMap<&str, Mark> = HashMap::with_capacity(graph.len());
    let mut path: Vec<&str> = Vec::new();
    let mut order: Vec<String> = Vec::new();

    let mut roots: Vec<&String> = graph.keys().collect();
    roots.sort_unstable();
    for root in roots {
        visit_for_order(root, graph, &mut state, &mut path, &mut order)?;
    }

    order.reverse();
    // Referenced-but-unregistered ids have nothing to stop.
    order.retain(|id| graph.contains_key(id));
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> Graph {
        edges
            .iter()
            .map(|(id, deps)| {
                (
                    id.to_string(),
                    deps.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_acyclic_diamond_ok() {
        let g = graph(&[
            ("app", &["api", "worker"]),
            ("api", &["db"]),
            ("worker", &["db"]),
            ("db", &[]),
        ]);
        assert!(check_acyclic(&g).is_ok());
    }

    #[test]
    fn test_two_node_cycle_detected() {
        let g = graph(&[("a", &["b"]), ("b", &["a"])]);
        let err = check_acyclic(&g).unwrap_err();
        match err {
            SupervisorError::CyclicDependency { cycle } => {
                assert_eq!(cycle, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_self_cycle_detected() {
        let g = graph(&[("a", &["a"])]);
        assert!(matches!(
            check_acyclic(&g),
            Err(SupervisorError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_dangling_edge_is_not_a_cycle() {
        let g = graph(&[("api", &["cache"])]);
        assert!(check_acyclic(&g).is_ok());
    }

    #[test]
    fn test_start_order_deps_first_deduplicated() {
        let g = graph(&[
            ("app", &["api", "worker"]),
            ("api", &["db"]),
            ("worker", &["db"]),
            ("db", &[]),
        ]);
        let order = start_order("app", &g).unwrap();
        assert_eq!(order.len(), 3, "db must appear once: {order:?}");
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(pos("db") < pos("api"));
        assert!(pos("db") < pos("worker"));
        assert!(!order.contains(&"app".to_string()));
    }

    #[test]
    fn test_start_order_includes_unknown_dependency() {
        let g = graph(&[("api", &["cache"])]);
        assert_eq!(start_order("api", &g).unwrap(), vec!["cache".to_string()]);
    }

    #[test]
    fn test_start_order_rejects_cycle() {
        let g = graph(&[("a", &["b"]), ("b", &["a"])]);
        assert!(matches!(
            start_order("a", &g),
            Err(SupervisorError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_shutdown_order_dependents_first() {
        let g = graph(&[("api", &["db"]), ("worker", &["db"]), ("db", &[])]);
        let order = shutdown_order(&g).unwrap();
        assert_eq!(order.len(), 3);
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(pos("api") < pos("db"));
        assert!(pos("worker") < pos("db"));
    }
}
