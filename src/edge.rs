//! A module for working with edges.

use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;

/// An unordered pair of vertices. Edges don't have a direction, despite the `source`-`target`
/// nomenclature used.
///
/// The vertex type defaults to a [`NodeId`], the form a [`Graph`](crate::graph::Graph) is built
/// from. Any other `Ord` type can be used with
/// [`Graph::from_labelled_edges`](crate::graph::Graph::from_labelled_edges).
#[derive(Clone, Copy, Debug, Eq, Serialize, Deserialize)]
pub struct Edge<T = NodeId> {
    source: T,
    target: T,
}

impl<T> Edge<T> {
    /// Creates a new edge from two vertices.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::edge::Edge;
    ///
    /// let edge = Edge::new(0, 1);
    /// assert_eq!(edge, Edge::new(1, 0));
    /// ```
    pub fn new(source: T, target: T) -> Self {
        Self { source, target }
    }

    /// Returns the first vertex forming the edge.
    pub fn source(&self) -> &T {
        &self.source
    }

    /// Returns the second vertex forming the edge.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Returns whether the edge contains the given vertex.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::edge::Edge;
    ///
    /// let edge = Edge::new("alice", "bob");
    ///
    /// assert!(edge.contains(&"alice"));
    /// assert!(!edge.contains(&"carol"));
    /// ```
    pub fn contains(&self, vertex: &T) -> bool
    where
        T: PartialEq,
    {
        self.source() == vertex || self.target() == vertex
    }

    /// Returns whether both ends of the edge are the same vertex.
    pub fn is_loop(&self) -> bool
    where
        T: PartialEq,
    {
        self.source == self.target
    }

    /// Returns the endpoints with the lesser vertex first.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::edge::Edge;
    ///
    /// assert_eq!(Edge::new(3, 1).ordered(), (&1, &3));
    /// ```
    pub fn ordered(&self) -> (&T, &T)
    where
        T: Ord,
    {
        match self.source.cmp(&self.target) {
            Ordering::Greater => (&self.target, &self.source),
            _ => (&self.source, &self.target),
        }
    }
}

impl<T> From<(T, T)> for Edge<T> {
    fn from((source, target): (T, T)) -> Self {
        Self::new(source, target)
    }
}

//
// Trait implementations
//

impl<T: PartialEq> PartialEq for Edge<T> {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.source, &self.target);
        let (c, d) = (&other.source, &other.target);

        a == d && b == c || a == c && b == d
    }
}

impl<T: Hash + Ord> Hash for Edge<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // (a, b) and (b, a) must hash identically.
        let (low, high) = self.ordered();
        low.hash(state);
        high.hash(state);
    }
}
