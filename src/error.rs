//! Fatal errors and the non-fatal notices attached to results.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{graph::NodeId, scores::Metric};

/// Errors raised while constructing a [`Graph`](crate::graph::Graph).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("edge {edge:?} references an unknown node, the graph has {node_count} nodes")]
    MalformedGraph {
        edge: (NodeId, NodeId),
        node_count: usize,
    },
    #[error("self-loop on node {0}")]
    SelfLoop(NodeId),
    #[error("{labels} labels supplied for {node_count} nodes")]
    LabelCount { labels: usize, node_count: usize },
}

/// Errors raised by the [`SbmEstimator`](crate::sbm::SbmEstimator).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SbmError {
    #[error("invalid estimator configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("invalid adjacency matrix: {0}")]
    InvalidAdjacency(&'static str),
    #[error("cannot fit a block model to a graph without nodes")]
    EmptyGraph,
    #[error("cannot fit {k_min} blocks to {nodes} nodes")]
    TooFewNodes { nodes: usize, k_min: usize },
}

/// A non-fatal condition observed during a computation.
///
/// Notices are carried on the result values and never returned as errors, aggregation over the
/// results proceeds regardless.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Notice {
    /// The metric has no defined value for the node (an isolate's closeness, the clustering
    /// coefficient of a node with fewer than two neighbours). Reported as zero.
    UndefinedMetric { metric: Metric, node: NodeId },
    /// The EM run for `blocks` blocks stopped at the iteration cap or the time budget before
    /// reaching the convergence tolerance.
    NonConvergence {
        blocks: usize,
        restart: usize,
        iterations: usize,
    },
    /// A connectivity entry of the retained fit is pinned at the numerical clip boundary.
    DegenerateBlock {
        blocks: usize,
        p: usize,
        q: usize,
        value: f64,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedMetric { metric, node } => {
                write!(f, "{metric} is undefined for node {node}, reported as 0")
            }
            Self::NonConvergence {
                blocks,
                restart,
                iterations,
            } => write!(
                f,
                "K={blocks} restart {restart} did not converge in {iterations} iterations"
            ),
            Self::DegenerateBlock {
                blocks,
                p,
                q,
                value,
            } => write!(f, "K={blocks} connectivity ({p}, {q}) pinned at {value:e}"),
        }
    }
}
