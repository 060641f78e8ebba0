use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::ProjectGraph;

/// Kahn's algorithm with a min-heap on node index, so among ready nodes the
/// lexically smallest task id always comes first.
pub fn topological_order(graph: &ProjectGraph) -> Vec<usize> {
    let n = graph.len();
    let mut in_degree: Vec<usize> = (0..n).map(|i| graph.predecessors(i).len()).collect();
    let mut ready: BinaryHeap<Reverse<usize>> =
        (0..n).filter(|&i| in_degree[i] == 0).map(Reverse).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &(next, _) in graph.successors(node) {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }
    order
}
