//! Integrated Completed Likelihood, the model selection criterion over block counts.
//!
//! Follows Daudin, Picard & Robin (2008), "A mixture model for random graphs": the complete-data
//! log-likelihood at the maximum a posteriori assignment, penalised by half the number of
//! connectivity parameters times the log of the number of node pairs and by half the number of
//! free proportions times the log of the number of nodes.

use nalgebra::{DMatrix, DVector};

use crate::graph::NodeId;

/// Assigns each node to the block of its largest membership, ties going to the lowest block.
pub(crate) fn block_assignment(membership: &DMatrix<f64>) -> Vec<usize> {
    membership
        .row_iter()
        .map(|row| {
            let mut best = 0;
            for (q, value) in row.iter().enumerate() {
                if *value > row[best] {
                    best = q;
                }
            }

            best
        })
        .collect()
}

/// `ln f(a; p)` for a Bernoulli mass `f`.
fn ln_bernoulli(edge: bool, p: f64) -> f64 {
    if edge {
        p.ln()
    } else {
        (1.0 - p).ln()
    }
}

/// The log-likelihood of the adjacency and the assignment under the fitted proportions and
/// connectivity.
pub(crate) fn complete_log_likelihood(
    adjacency: &DMatrix<f64>,
    assignment: &[usize],
    proportions: &DVector<f64>,
    connectivity: &DMatrix<f64>,
) -> f64 {
    let membership: f64 = assignment.iter().map(|&q| proportions[q].ln()).sum();

    let mut edges = 0.0;
    for (i, &p) in assignment.iter().enumerate() {
        for (j, &q) in assignment.iter().enumerate().skip(i + 1) {
            edges += ln_bernoulli(adjacency[(i, j)] > 0.5, connectivity[(p, q)]);
        }
    }

    membership + edges
}

/// `½ · K(K+1)/2 · ln(n(n-1)/2) + ½ · (K-1) · ln n`, the pair count floored at one.
pub(crate) fn penalty(blocks: usize, nodes: usize) -> f64 {
    let k = blocks as f64;
    let n = nodes.max(1) as f64;
    let pairs = (n * (n - 1.0) / 2.0).max(1.0);

    0.5 * (k * (k + 1.0) / 2.0) * pairs.ln() + 0.5 * (k - 1.0) * n.ln()
}

/// The ICL of a fit, see the module documentation.
pub(crate) fn icl(
    adjacency: &DMatrix<f64>,
    assignment: &[NodeId],
    proportions: &DVector<f64>,
    connectivity: &DMatrix<f64>,
) -> f64 {
    complete_log_likelihood(adjacency, assignment, proportions, connectivity)
        - penalty(proportions.len(), assignment.len())
}

#[cfg(test)]
mod tests {
    use nalgebra::{dmatrix, dvector};

    use super::*;

    #[test]
    fn assignment_ties_go_to_the_lowest_block() {
        let membership = dmatrix![
            0.2, 0.8;
            0.5, 0.5;
            0.3, 0.3;
            1.0, 0.0
        ];

        assert_eq!(block_assignment(&membership), vec![1, 0, 0, 0]);
    }

    #[test]
    fn penalty_grows_with_blocks() {
        for nodes in [2, 10, 100] {
            for blocks in 1..6 {
                assert!(penalty(blocks + 1, nodes) > penalty(blocks, nodes));
            }
        }
    }

    #[test]
    fn penalty_of_tiny_graphs_is_finite() {
        assert_eq!(penalty(1, 1), 0.0);
        assert!(penalty(1, 0).is_finite());
    }

    #[test]
    fn penalty_value() {
        // ½ · 3 · ln 45 + ½ · ln 10.
        let expected = 1.5 * 45f64.ln() + 0.5 * 10f64.ln();
        assert!((penalty(2, 10) - expected).abs() < 1e-12);
    }

    #[test]
    fn single_block_likelihood() {
        // A path on three nodes: 2 edges and 1 non-edge among 3 pairs.
        let adjacency = dmatrix![
            0.0, 1.0, 0.0;
            1.0, 0.0, 1.0;
            0.0, 1.0, 0.0
        ];
        let p = 2.0 / 3.0;

        let likelihood = complete_log_likelihood(
            &adjacency,
            &[0, 0, 0],
            &dvector![1.0],
            &dmatrix![p],
        );

        let expected = 2.0 * p.ln() + (1.0 - p).ln();
        assert!((likelihood - expected).abs() < 1e-12);

        let score = icl(&adjacency, &[0, 0, 0], &dvector![1.0], &dmatrix![p]);
        assert!((score - (expected - 0.5 * 3f64.ln())).abs() < 1e-12);
    }
}
