//! Degree, betweenness and closeness centrality.
//!
//! All functions are pure, they read the graph and return a fresh [`NodeScores`] vector indexed by
//! node id. Betweenness and closeness run a breadth-first search from every node, spread over
//! worker threads.
//!
//! ```
//! use strata::centrality;
//! use strata::edge::Edge;
//! use strata::graph::Graph;
//!
//! // A star: node 0 at the centre of three leaves.
//! let graph = Graph::new(4, [Edge::new(0, 1), Edge::new(0, 2), Edge::new(0, 3)]).unwrap();
//!
//! assert_eq!(centrality::degree(&graph).value(0), 3.0);
//! assert_eq!(centrality::betweenness(&graph).value(0), 3.0);
//! assert_eq!(centrality::closeness(&graph).value(1), 3.0 / 5.0);
//! ```

use tracing::instrument;

use crate::{
    betweenness::compute_betweenness,
    closeness::compute_closeness,
    graph::Graph,
    pool,
    scores::{Metric, NodeScores},
};

/// Options for [`betweenness_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BetweennessOptions {
    /// Worker threads, clamped to `1..=128`.
    pub num_threads: usize,
    /// Divide by the number of pairs not involving the node, `(n - 1)(n - 2) / 2`.
    pub normalized: bool,
}

impl Default for BetweennessOptions {
    fn default() -> Self {
        Self {
            num_threads: pool::default_num_threads(),
            normalized: false,
        }
    }
}

/// Returns the number of edges incident to each node.
#[instrument(skip_all, fields(nodes = graph.node_count()))]
pub fn degree(graph: &Graph) -> NodeScores {
    let degrees = graph.nodes().map(|node| graph.degree(node) as f64).collect();

    NodeScores::defined(Metric::Degree, degrees)
}

/// Returns the betweenness of each node: the sum, over all unordered pairs of other nodes, of the
/// fraction of their shortest paths passing through the node.
///
/// Disconnected pairs contribute nothing.
pub fn betweenness(graph: &Graph) -> NodeScores {
    betweenness_with(graph, BetweennessOptions::default())
}

/// [`betweenness`] with an explicit thread count and optional normalization.
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn betweenness_with(graph: &Graph, options: BetweennessOptions) -> NodeScores {
    let scores = compute_betweenness(graph, options.num_threads, options.normalized);

    NodeScores::defined(Metric::Betweenness, scores)
}

/// Returns the closeness of each node: the number of nodes it reaches divided by the sum of the
/// distances to them.
///
/// A node reaching no other node has no closeness, its entry is undefined (see
/// [`NodeScores::value`] for the zero substitution).
pub fn closeness(graph: &Graph) -> NodeScores {
    closeness_with(graph, pool::default_num_threads())
}

/// [`closeness`] with an explicit thread count.
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn closeness_with(graph: &Graph, num_threads: usize) -> NodeScores {
    NodeScores::new(Metric::Closeness, compute_closeness(graph, num_threads))
}
