//! Strata is a small toolkit for analysing the structure of undirected, unweighted social graphs:
//! how central each node is, how clustered the neighbourhoods are and which latent communities
//! the edges suggest.
//!
//! # Basic usage
//!
//! The library is centered around the immutable [`Graph`](graph::Graph) structure, built once from
//! a node count (or labels) and a set of [`Edge`](edge::Edge) instances. The engines then read it:
//!
//! - [`centrality`]: degree, betweenness and closeness,
//! - [`transitivity`]: local clustering coefficients and the global transitivity,
//! - [`sbm`]: stochastic block model estimation with model selection over the block count.
//!
//! ```rust
//! use strata::edge::Edge;
//! use strata::graph::Graph;
//! use strata::{centrality, transitivity};
//!
//! // Labelled edges are indexed in label order: alice = 0, bob = 1, carol = 2, dave = 3.
//! let graph = Graph::from_labelled_edges([
//!     Edge::new("alice", "bob"),
//!     Edge::new("bob", "carol"),
//!     Edge::new("carol", "alice"),
//!     Edge::new("carol", "dave"),
//! ])
//! .unwrap();
//!
//! let betweenness = centrality::betweenness(&graph);
//! let carol = graph.index_of("carol").unwrap();
//!
//! // Carol sits on every shortest path to dave.
//! assert_eq!(betweenness.top(1), vec![carol]);
//! assert_eq!(transitivity::global_clustering(&graph), 0.6);
//!
//! // Matrices can be pretty printed...
//! println!("{}", graph.laplacian_matrix());
//! ```
//!
//! Values a metric leaves undefined, such as the closeness of an isolated node, are kept as
//! `None` in the returned [`NodeScores`](scores::NodeScores) and read as `0.0` by every aggregate;
//! they are surfaced as [`Notice`](error::Notice)s rather than errors.

mod betweenness;
mod closeness;
mod pool;

pub mod centrality;
pub mod edge;
pub mod error;
pub mod graph;
pub mod sbm;
pub mod scores;
pub mod transitivity;
