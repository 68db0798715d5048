//! A module for working with graphs.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    fmt::Display,
    hash::Hash,
    ops::{Range, Sub},
};

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::{edge::Edge, error::GraphError};

/// Stable identifier of a node, its position in `0..node_count`.
pub type NodeId = usize;

/// An immutable undirected graph.
///
/// Nodes are identified by `0..node_count` and may carry a label. The graph is validated at
/// construction and exposes no mutation, the analysis engines only ever see it through a shared
/// reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    /// The neighbour set of each node, indexed by node id.
    ///
    /// Sets keep neighbour iteration ordered, which keeps the traversal order (and so the
    /// floating point summation order) stable between runs.
    neighbors: Vec<BTreeSet<NodeId>>,
    /// Optional human-readable label of each node.
    labels: Vec<Option<String>>,
    /// The number of distinct undirected edges.
    edge_count: usize,
}

impl Graph {
    /// Creates a graph of `node_count` unlabelled nodes from a set of edges.
    ///
    /// Parallel edges are collapsed into one. Edges referencing a node outside `0..node_count` or
    /// connecting a node to itself are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::edge::Edge;
    /// use strata::error::GraphError;
    /// use strata::graph::Graph;
    ///
    /// let graph = Graph::new(3, [Edge::new(0, 1), Edge::new(1, 2)]).unwrap();
    /// assert_eq!(graph.edge_count(), 2);
    ///
    /// let err = Graph::new(2, [Edge::new(0, 5)]).unwrap_err();
    /// assert!(matches!(err, GraphError::MalformedGraph { .. }));
    /// ```
    pub fn new<I>(node_count: usize, edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = Edge>,
    {
        let mut neighbors = vec![BTreeSet::new(); node_count];
        let mut edge_count = 0;

        for edge in edges {
            let (a, b) = (*edge.source(), *edge.target());

            if a >= node_count || b >= node_count {
                return Err(GraphError::MalformedGraph {
                    edge: (a, b),
                    node_count,
                });
            }

            if edge.is_loop() {
                return Err(GraphError::SelfLoop(a));
            }

            // Both directions are always written together, checking one is enough.
            if neighbors[a].insert(b) {
                neighbors[b].insert(a);
                edge_count += 1;
            }
        }

        Ok(Self {
            neighbors,
            labels: vec![None; node_count],
            edge_count,
        })
    }

    /// Creates a graph of `node_count` nodes, node `i` carrying `labels[i]`.
    ///
    /// The label list must hold exactly one label per node.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::edge::Edge;
    /// use strata::error::GraphError;
    /// use strata::graph::Graph;
    ///
    /// let labels = vec!["ann".to_string(), "ben".to_string()];
    /// let err = Graph::with_labels(3, labels, [Edge::new(0, 1)]).unwrap_err();
    ///
    /// assert_eq!(err, GraphError::LabelCount { labels: 2, node_count: 3 });
    /// ```
    pub fn with_labels<I>(
        node_count: usize,
        labels: Vec<String>,
        edges: I,
    ) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = Edge>,
    {
        if labels.len() != node_count {
            return Err(GraphError::LabelCount {
                labels: labels.len(),
                node_count,
            });
        }

        let mut graph = Self::new(node_count, edges)?;
        graph.labels = labels.into_iter().map(Some).collect();

        Ok(graph)
    }

    /// Creates a graph from edges between arbitrary vertices.
    ///
    /// The vertices are indexed in ascending order, so the same set of edges always yields the
    /// same node ids. Each node is labelled with its vertex's `Display` output.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::edge::Edge;
    /// use strata::graph::Graph;
    ///
    /// let graph = Graph::from_labelled_edges([
    ///     Edge::new("carol", "alice"),
    ///     Edge::new("alice", "bob"),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(graph.node_count(), 3);
    /// assert_eq!(graph.label(0), Some("alice"));
    /// assert_eq!(graph.index_of("carol"), Some(2));
    /// ```
    pub fn from_labelled_edges<T, I>(edges: I) -> Result<Self, GraphError>
    where
        T: Clone + Display + Eq + Hash + Ord,
        I: IntoIterator<Item = Edge<T>>,
    {
        // Using a hashset collapses (a, b) and (b, a) as edge equality is symmetric.
        let edges: HashSet<Edge<T>> = edges.into_iter().collect();
        let index = generate_index(&edges);

        let indexed: Vec<Edge> = edges
            .iter()
            .filter_map(|edge| {
                let i = index.get(edge.source())?;
                let j = index.get(edge.target())?;
                Some(Edge::new(*i, *j))
            })
            .collect();

        let labels = index.keys().map(ToString::to_string).collect();

        Self::with_labels(index.len(), labels, indexed)
    }

    /// Returns the node count of the graph.
    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Returns the edge count of the graph.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns the range of node ids.
    pub fn nodes(&self) -> Range<NodeId> {
        0..self.node_count()
    }

    /// Iterates over every edge once, as `(low, high)` node id pairs in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(a, set)| {
            set.range(a + 1..).map(move |&b| (a, b))
        })
    }

    /// Returns the neighbours of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn neighbors(&self, node: NodeId) -> &BTreeSet<NodeId> {
        &self.neighbors[node]
    }

    /// Returns the number of edges incident to a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn degree(&self, node: NodeId) -> usize {
        self.neighbors[node].len()
    }

    /// Checks if the graph contains an edge between `a` and `b`. Unknown nodes have no edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::edge::Edge;
    /// use strata::graph::Graph;
    ///
    /// let graph = Graph::new(3, [Edge::new(0, 1)]).unwrap();
    ///
    /// assert!(graph.has_edge(1, 0));
    /// assert!(!graph.has_edge(1, 2));
    /// assert!(!graph.has_edge(1, 9));
    /// ```
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors
            .get(a)
            .map_or(false, |neighbors| neighbors.contains(&b))
    }

    /// Returns the label of a node, if it has one.
    pub fn label(&self, node: NodeId) -> Option<&str> {
        self.labels.get(node)?.as_deref()
    }

    /// Returns the id of the first node carrying the label.
    pub fn index_of(&self, label: &str) -> Option<NodeId> {
        self.labels
            .iter()
            .position(|l| l.as_deref() == Some(label))
    }

    /// Computes the density of the graph, the ratio of edges with respect to the maximum possible
    /// edges. `0.0` when fewer than two nodes make any edge impossible.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::edge::Edge;
    /// use strata::graph::Graph;
    ///
    /// let graph = Graph::new(3, [Edge::new(0, 1), Edge::new(0, 2)]).unwrap();
    /// assert_eq!(graph.density(), 2.0 / 3.0);
    /// ```
    pub fn density(&self) -> f64 {
        let vc = self.node_count() as f64;
        let ec = self.edge_count() as f64;

        // Calculate the total number of possible edges given a vertex count.
        let pec = vc * (vc - 1.0) / 2.0;
        if pec == 0.0 {
            return 0.0;
        }

        ec / pec
    }

    /// Constructs the adjacency matrix for this graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::dmatrix;
    /// use strata::edge::Edge;
    /// use strata::graph::Graph;
    ///
    /// let graph = Graph::new(2, [Edge::new(0, 1)]).unwrap();
    /// assert_eq!(
    ///     graph.adjacency_matrix(),
    ///     dmatrix![0.0, 1.0;
    ///              1.0, 0.0]
    /// );
    /// ```
    pub fn adjacency_matrix(&self) -> DMatrix<f64> {
        let n = self.node_count();
        let mut matrix = DMatrix::<f64>::zeros(n, n);

        // The graph is undirected so both the upper and lower triangles are written for each
        // edge, leaving the diagonal at zero.
        for (i, j) in self.edges() {
            matrix[(i, j)] = 1.0;
            matrix[(j, i)] = 1.0;
        }

        matrix
    }

    /// Constructs the degree matrix for this graph.
    pub fn degree_matrix(&self) -> DMatrix<f64> {
        degree_matrix(&self.adjacency_matrix())
    }

    /// Constructs the laplacian matrix for this graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::dmatrix;
    /// use strata::edge::Edge;
    /// use strata::graph::Graph;
    ///
    /// let graph = Graph::new(2, [Edge::new(0, 1)]).unwrap();
    /// assert_eq!(
    ///     graph.laplacian_matrix(),
    ///     dmatrix![1.0, -1.0;
    ///              -1.0, 1.0]
    /// );
    /// ```
    pub fn laplacian_matrix(&self) -> DMatrix<f64> {
        laplacian_matrix(&self.adjacency_matrix())
    }
}

//
// Helpers
//

/// Constructs and returns an index of vertices for this set of edges, sorted by `T`'s
/// implementation of `Ord`.
fn generate_index<T>(edges: &HashSet<Edge<T>>) -> BTreeMap<T, NodeId>
where
    T: Clone + Ord,
{
    let vertices: BTreeSet<T> = edges
        .iter()
        .flat_map(|edge| [edge.source().clone(), edge.target().clone()])
        .collect();

    vertices
        .into_iter()
        .enumerate()
        .map(|(i, vertex)| (vertex, i))
        .collect()
}

/// Computes the degree matrix of an adjacency matrix.
pub(crate) fn degree_matrix(adjacency: &DMatrix<f64>) -> DMatrix<f64> {
    let n = adjacency.nrows();
    let mut matrix = DMatrix::<f64>::zeros(n, n);

    for (i, row) in adjacency.row_iter().enumerate() {
        // The diagonal is the sum of edges in that row.
        matrix[(i, i)] = row.sum()
    }

    matrix
}

/// Computes the laplacian `D - A` of an adjacency matrix.
pub(crate) fn laplacian_matrix(adjacency: &DMatrix<f64>) -> DMatrix<f64> {
    degree_matrix(adjacency).sub(adjacency)
}

/// Computes the eigenvalues and corresponding eigenvectors of the supplied symmetric matrix, sorted
/// by eigenvalue.
pub(crate) fn sorted_eigenvalue_vector_pairs(
    matrix: DMatrix<f64>,
    ascending: bool,
) -> Vec<(f64, DVector<f64>)> {
    // Early return if the matrix is empty, the rest of the computation requires a matrix with
    // at least a dim of 1x1.
    if matrix.is_empty() {
        return vec![];
    }

    let eigen = SymmetricEigen::new(matrix);

    // Map eigenvalues to their eigenvectors.
    let mut pairs: Vec<(f64, DVector<f64>)> = eigen
        .eigenvalues
        .iter()
        .zip(eigen.eigenvectors.column_iter())
        .map(|(value, vector)| (*value, vector.clone_owned()))
        .collect();

    // `total_cmp` keeps the ordering total should the decomposition produce a NaN.
    pairs.sort_by(|(a, _), (b, _)| {
        if ascending {
            a.total_cmp(b)
        } else {
            b.total_cmp(a)
        }
    });

    pairs
}
