//! Local and global clustering coefficients.
//!
//! The local clustering coefficient of a node is the fraction of pairs of its neighbours that are
//! themselves connected. The global transitivity is the fraction of connected triples (paths of
//! length two) that are closed into triangles. The two generally differ: the global value weighs
//! every triple equally, the mean of the local values weighs every node equally.

use itertools::Itertools;
use tracing::instrument;

use crate::{
    graph::{Graph, NodeId},
    scores::{Metric, NodeScores},
};

/// Counts the edges between the neighbours of a node, that is the triangles it belongs to.
fn closed_neighbor_pairs(graph: &Graph, node: NodeId) -> usize {
    graph
        .neighbors(node)
        .iter()
        .tuple_combinations()
        .filter(|(u, w)| graph.has_edge(**u, **w))
        .count()
}

/// The number of neighbour pairs of a node of the given degree, `choose(degree, 2)`.
fn neighbor_pairs(degree: usize) -> usize {
    degree * degree.saturating_sub(1) / 2
}

/// Returns the number of triangles each node belongs to.
pub fn triangles(graph: &Graph) -> Vec<usize> {
    graph
        .nodes()
        .map(|node| closed_neighbor_pairs(graph, node))
        .collect()
}

/// Returns the number of distinct triangles in the graph.
pub fn triangle_count(graph: &Graph) -> usize {
    // Each triangle is seen from its three corners.
    triangles(graph).iter().sum::<usize>() / 3
}

/// Returns the local clustering coefficient of every node.
///
/// Nodes with fewer than two neighbours have no neighbour pairs and their coefficient is left
/// undefined; aggregates over the returned [`NodeScores`] count them as `0.0`.
///
/// # Examples
///
/// ```
/// use strata::edge::Edge;
/// use strata::graph::Graph;
/// use strata::transitivity::local_clustering;
///
/// // A triangle with a pendant node hanging off node 2.
/// let graph = Graph::new(
///     4,
///     [Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 0), Edge::new(2, 3)],
/// )
/// .unwrap();
/// let clustering = local_clustering(&graph);
///
/// assert_eq!(clustering.get(0), Some(1.0));
/// assert_eq!(clustering.get(2), Some(1.0 / 3.0));
/// assert_eq!(clustering.get(3), None);
/// ```
#[instrument(skip_all, fields(nodes = graph.node_count()))]
pub fn local_clustering(graph: &Graph) -> NodeScores {
    let values = graph
        .nodes()
        .map(|node| {
            let degree = graph.degree(node);

            (degree >= 2).then(|| {
                closed_neighbor_pairs(graph, node) as f64 / neighbor_pairs(degree) as f64
            })
        })
        .collect();

    NodeScores::new(Metric::LocalClustering, values)
}

/// Returns the mean local clustering coefficient, undefined entries counting as zero.
pub fn average_clustering(graph: &Graph) -> f64 {
    local_clustering(graph).mean()
}

/// Returns the global transitivity: three times the number of triangles over the number of
/// connected triples.
///
/// Nodes with fewer than two neighbours are the centre of no triple and add nothing to either
/// count. A graph without any connected triple has a transitivity of `0.0`.
#[instrument(skip_all, fields(nodes = graph.node_count()))]
pub fn global_clustering(graph: &Graph) -> f64 {
    let (closed, triples) = graph.nodes().fold((0, 0), |(closed, triples), node| {
        (
            closed + closed_neighbor_pairs(graph, node),
            triples + neighbor_pairs(graph.degree(node)),
        )
    });

    if triples == 0 {
        return 0.0;
    }

    // Summing the closed pairs over every centre counts each triangle three times.
    closed as f64 / triples as f64
}
