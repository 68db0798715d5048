//! Per-node score vectors produced by the centrality and transitivity engines.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::{error::Notice, graph::NodeId};

/// The measurement a [`NodeScores`] vector holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Degree,
    Betweenness,
    Closeness,
    LocalClustering,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Degree => "degree",
            Self::Betweenness => "betweenness",
            Self::Closeness => "closeness",
            Self::LocalClustering => "local clustering",
        };

        f.write_str(name)
    }
}

/// A mapping of node ids to scores, indexed by [`NodeId`].
///
/// Some metrics have no defined value for some nodes: an isolate has no closeness and a node with
/// fewer than two neighbours has no clustering coefficient. The raw value of such a node is `None`
/// when read with [`get`](Self::get). Every aggregate and every zero-substituting accessor treats it
/// as `0.0`; undefined entries never surface as `NaN`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeScores {
    metric: Metric,
    values: Vec<Option<f64>>,
}

impl NodeScores {
    /// Creates a score vector that may contain undefined entries.
    pub fn new(metric: Metric, values: Vec<Option<f64>>) -> Self {
        Self { metric, values }
    }

    /// Creates a score vector in which every entry is defined.
    pub fn defined(metric: Metric, values: Vec<f64>) -> Self {
        Self::new(metric, values.into_iter().map(Some).collect())
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the raw score of a node, `None` if it is undefined or the node doesn't exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::scores::{Metric, NodeScores};
    ///
    /// let scores = NodeScores::new(Metric::Closeness, vec![Some(0.5), None]);
    ///
    /// assert_eq!(scores.get(0), Some(0.5));
    /// assert_eq!(scores.get(1), None);
    /// assert_eq!(scores.value(1), 0.0);
    /// ```
    pub fn get(&self, node: NodeId) -> Option<f64> {
        self.values.get(node).copied().flatten()
    }

    /// Returns the score of a node with undefined entries substituted by `0.0`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn value(&self, node: NodeId) -> f64 {
        self.values[node].unwrap_or(0.0)
    }

    /// Returns whether the node's score is defined.
    pub fn is_defined(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// Iterates over `(node, raw score)` pairs in node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Option<f64>)> + '_ {
        self.values.iter().copied().enumerate()
    }

    /// Returns the scores with undefined entries substituted by `0.0`.
    pub fn zero_filled(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(0.0)).collect()
    }

    /// Returns the nodes whose score is undefined.
    pub fn undefined_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, v)| v.is_none())
            .map(|(node, _)| node)
            .collect()
    }

    /// Returns one [`Notice::UndefinedMetric`] per undefined entry.
    pub fn notices(&self) -> Vec<Notice> {
        self.undefined_nodes()
            .into_iter()
            .map(|node| Notice::UndefinedMetric {
                metric: self.metric,
                node,
            })
            .collect()
    }

    /// The mean over all nodes, undefined entries counting as zero. `0.0` for an empty vector.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }

        self.zero_filled().iter().sum::<f64>() / self.values.len() as f64
    }

    /// The largest score, undefined entries counting as zero.
    pub fn max(&self) -> Option<f64> {
        self.zero_filled().into_iter().reduce(f64::max)
    }

    /// Returns every node paired with its score, highest score first. Ties are broken by the
    /// lowest node id.
    pub fn ranked(&self) -> Vec<(NodeId, f64)> {
        let mut ranked: Vec<(NodeId, f64)> = self.zero_filled().into_iter().enumerate().collect();
        ranked.sort_by(|(a, x), (b, y)| {
            y.partial_cmp(x)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.cmp(b))
        });

        ranked
    }

    /// Returns the `k` highest scoring nodes, see [`ranked`](Self::ranked).
    pub fn top(&self, k: usize) -> Vec<NodeId> {
        self.ranked()
            .into_iter()
            .take(k)
            .map(|(node, _)| node)
            .collect()
    }
}
