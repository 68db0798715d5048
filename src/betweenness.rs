//! A module for performing the multi-threaded computation of betweenness.

use std::collections::VecDeque;

use crate::{graph::Graph, pool};

/// This is an implementation of Ulrik Brandes's
/// A Faster Algorithm for Betweenness Centrality
/// http://snap.stanford.edu/class/cs224w-readings/brandes01centrality.pdf
/// page 10, "Algorithm 1: Betweenness centrality in unweighted graphs"
///
/// Accumulates the dependencies of every node on the shortest paths leaving `source`.
fn betweenness_for_node(source: usize, graph: &Graph, betweenness_count: &mut [f64]) {
    let num_nodes = graph.node_count();

    // sigma[w]: number of shortest paths from the source to w.
    let mut sigma: Vec<f64> = vec![0.0; num_nodes];
    // distance[w]: BFS depth of w, `None` while unvisited.
    let mut distance: Vec<Option<usize>> = vec![None; num_nodes];
    // predecessors[w]: the nodes immediately preceding w on shortest paths.
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
    let mut delta: Vec<f64> = vec![0.0; num_nodes];
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut stack: Vec<usize> = Vec::with_capacity(num_nodes);

    sigma[source] = 1.0;
    distance[source] = Some(0);
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        stack.push(v);
        let next = distance[v].map_or(0, |d| d + 1);

        for &w in graph.neighbors(v) {
            if distance[w].is_none() {
                distance[w] = Some(next);
                queue.push_back(w);
            }

            if distance[w] == Some(next) {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    // Nodes are popped farthest first, so a node's dependency is complete before it is passed on
    // to its predecessors.
    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }

        if w != source {
            betweenness_count[w] += delta[w];
        }
    }
}

/// Computes the betweenness of every node in the graph, sources spread over `num_threads`
/// workers.
///
/// Every unordered pair is visited from both of its ends, the raw sums are halved. When
/// `normalize` is set they are further divided by the `(n - 1)(n - 2) / 2` pairs not involving
/// the node.
pub(crate) fn compute_betweenness(graph: &Graph, num_threads: usize, normalize: bool) -> Vec<f64> {
    let num_nodes = graph.node_count();

    let partials = pool::run(
        num_nodes,
        num_threads,
        || vec![0.0; num_nodes],
        |source, acc: &mut Vec<f64>| betweenness_for_node(source, graph, acc),
    );

    let divisor: f64 = if normalize && num_nodes > 2 {
        ((num_nodes - 1) * (num_nodes - 2)) as f64
    } else {
        // Non-normalized: everything is counted twice, so we must divide by two.
        2.0
    };

    let mut betweenness_count: Vec<f64> = vec![0.0; num_nodes];
    for partial in partials {
        for (total, b) in betweenness_count.iter_mut().zip(partial) {
            *total += b;
        }
    }

    betweenness_count.iter_mut().for_each(|b| *b /= divisor);
    betweenness_count
}
