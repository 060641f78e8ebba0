use std::collections::HashMap;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Find one cycle in an index-addressed adjacency list using an iterative
/// three-color DFS. Roots are visited in index order and children in list
/// order, so the reported cycle is stable for a given input.
///
/// The returned cycle starts at the node the back edge points to and follows
/// edge direction: `[a, b, c]` means `a -> b -> c -> a`.
pub fn find_cycle_indexed(adjacency: &[Vec<usize>]) -> Option<Vec<usize>> {
    let n = adjacency.len();
    let mut mark = vec![Mark::Unvisited; n];
    // (node, index of the next child to visit)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if mark[root] != Mark::Unvisited {
            continue;
        }
        mark[root] = Mark::InProgress;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            if frame.1 < adjacency[node].len() {
                let child = adjacency[node][frame.1];
                frame.1 += 1;
                match mark[child] {
                    Mark::Unvisited => {
                        mark[child] = Mark::InProgress;
                        stack.push((child, 0));
                    }
                    Mark::InProgress => {
                        let start = stack.iter().position(|&(n, _)| n == child).unwrap_or(0);
                        return Some(stack[start..].iter().map(|&(n, _)| n).collect());
                    }
                    Mark::Done => {}
                }
            } else {
                mark[node] = Mark::Done;
                stack.pop();
            }
        }
    }
    None
}

/// Find a cycle in a graph given by named nodes and `(from, to)` edges.
/// Edges naming unknown nodes add them implicitly.
pub fn find_cycle(nodes: &[String], edges: &[(String, String)]) -> Option<Vec<String>> {
    let mut names: Vec<&str> = nodes.iter().map(String::as_str).collect();
    for (from, to) in edges {
        names.push(from);
        names.push(to);
    }
    names.sort_unstable();
    names.dedup();

    let index: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    let mut adjacency = vec![Vec::new(); names.len()];
    for (from, to) in edges {
        adjacency[index[from.as_str()]].push(index[to.as_str()]);
    }
    for list in &mut adjacency {
        list.sort_unstable();
    }

    find_cycle_indexed(&adjacency).map(|cycle| cycle.into_iter().map(|i| names[i].to_string()).collect())
}

/// Reject any graph that contains a cycle.
pub fn detect_cycle(nodes: &[String], edges: &[(String, String)]) -> Result<(), EngineError> {
    match find_cycle(nodes, edges) {
        Some(cycle) => Err(EngineError::CycleDetected { cycle }),
        None => Ok(()),
    }
}

/// Check whether adding `from -> to` to an acyclic graph would close a cycle.
pub fn would_create_cycle(
    nodes: &[String],
    existing_edges: &[(String, String)],
    from: &str,
    to: &str,
) -> Result<(), EngineError> {
    let mut edges = existing_edges.to_vec();
    edges.push((from.to_string(), to.to_string()));
    detect_cycle(nodes, &edges)
}
