//! A module for performing the multi-threaded computation of closeness.

use std::collections::VecDeque;

use crate::{graph::Graph, pool};

/// Shortest path totals of a source node: the sum of distances to the nodes it reaches and how
/// many nodes that is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Reach {
    total_path_length: u64,
    reachable: u64,
}

fn closeness_for_node(index: usize, graph: &Graph) -> Reach {
    let num_nodes = graph.node_count();

    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut deltas: Vec<Option<u64>> = vec![None; num_nodes];
    let mut reach = Reach::default();

    deltas[index] = Some(0);
    queue.push_back(index);

    while let Some(current) = queue.pop_front() {
        let next = deltas[current].map_or(0, |d| d + 1);

        for &neighbor in graph.neighbors(current) {
            if deltas[neighbor].is_none() {
                deltas[neighbor] = Some(next);
                queue.push_back(neighbor);

                reach.total_path_length += next;
                reach.reachable += 1;
            }
        }
    }

    reach
}

/// Computes the closeness of every node, `None` for nodes that reach no other node.
///
/// The closeness of a node is the number of nodes it reaches divided by the sum of the distances
/// to them, so only the component containing the node is taken into account.
pub(crate) fn compute_closeness(graph: &Graph, num_threads: usize) -> Vec<Option<f64>> {
    let num_nodes = graph.node_count();

    // Each source is handled by exactly one worker, the others leave its slot at zero, which makes
    // summing the partial vectors a merge.
    let partials = pool::run(
        num_nodes,
        num_threads,
        || vec![Reach::default(); num_nodes],
        |index, acc: &mut Vec<Reach>| acc[index] = closeness_for_node(index, graph),
    );

    let mut totals = vec![Reach::default(); num_nodes];
    for partial in partials {
        for (total, reach) in totals.iter_mut().zip(partial) {
            total.total_path_length += reach.total_path_length;
            total.reachable += reach.reachable;
        }
    }

    totals
        .into_iter()
        .map(|reach| {
            (reach.reachable > 0)
                .then(|| reach.reachable as f64 / reach.total_path_length as f64)
        })
        .collect()
}
