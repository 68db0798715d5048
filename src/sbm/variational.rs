//! A single variational EM run for a fixed number of blocks.
//!
//! The posterior over block memberships is approximated by a fully factorised distribution, one
//! categorical per node (the rows of `tau`). The run alternates between updating those rows given
//! the parameters (E-step) and the parameters given the rows (M-step), each step increasing the
//! variational lower bound of the log-likelihood.

use std::time::{Duration, Instant};

use nalgebra::{DMatrix, DVector, RowDVector};

/// Expected block-level sufficient statistics under a membership matrix.
pub(crate) struct BlockStats {
    /// `edges[(p, q)]`: expected number of edges from block `p` to block `q`, over ordered node
    /// pairs.
    edges: DMatrix<f64>,
    /// `pairs[(p, q)]`: expected number of ordered pairs of distinct nodes from `p` to `q`.
    pairs: DMatrix<f64>,
    /// Expected size of each block.
    sizes: RowDVector<f64>,
}

impl BlockStats {
    pub(crate) fn new(adjacency: &DMatrix<f64>, tau: &DMatrix<f64>) -> Self {
        let sizes = tau.row_sum();
        let edges = tau.transpose() * (adjacency * tau);
        // Every ordered pair of memberships, minus the pairs of a node with itself.
        let pairs = sizes.transpose() * &sizes - tau.transpose() * tau;

        Self {
            edges,
            pairs,
            sizes,
        }
    }
}

/// The variational parameters and model parameters of a run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Variational {
    /// Membership matrix, `n × K`, each row a distribution over blocks.
    pub(crate) tau: DMatrix<f64>,
    /// Block proportions.
    pub(crate) alpha: DVector<f64>,
    /// Symmetric block connectivity, clipped to `[epsilon, 1 - epsilon]`.
    pub(crate) pi: DMatrix<f64>,
    /// Connectivity entries `(p, q)`, `p <= q`, whose estimate hit the clip.
    pub(crate) degenerate: Vec<(usize, usize)>,
}

impl Variational {
    /// Creates the state for an initial membership, fitting the parameters to it.
    pub(crate) fn new(adjacency: &DMatrix<f64>, tau: DMatrix<f64>, epsilon: f64) -> Self {
        let blocks = tau.ncols();
        let mut state = Self {
            tau,
            alpha: DVector::from_element(blocks, 1.0 / blocks as f64),
            pi: DMatrix::from_element(blocks, blocks, 0.5),
            degenerate: Vec::new(),
        };

        let stats = BlockStats::new(adjacency, &state.tau);
        state.m_step(&stats, epsilon);

        state
    }

    pub(crate) fn blocks(&self) -> usize {
        self.tau.ncols()
    }

    /// Updates the membership rows one node at a time, each update seeing the rows updated before
    /// it. Returns the largest absolute change of any entry.
    ///
    /// For node `i` and block `q`:
    /// `tau[i][q] ∝ alpha[q] · Π_{j≠i} Π_l f(A[i][j]; pi[q][l])^tau[j][l]`
    /// with `f` the Bernoulli mass.
    pub(crate) fn e_step(&mut self, adjacency: &DMatrix<f64>) -> f64 {
        let (nodes, blocks) = self.tau.shape();

        let ln_alpha = self.alpha.map(f64::ln);
        let ln_pi = self.pi.map(f64::ln);
        let ln_not_pi = self.pi.map(|p| (1.0 - p).ln());

        let mut sizes = self.tau.row_sum();
        let mut max_delta: f64 = 0.0;
        let mut logits = vec![0.0; blocks];

        for i in 0..nodes {
            // Expected number of i's neighbours in each block.
            let neighbor_mass = adjacency.row(i) * &self.tau;

            for (q, logit) in logits.iter_mut().enumerate() {
                *logit = ln_alpha[q]
                    + (0..blocks)
                        .map(|l| {
                            let linked = neighbor_mass[l];
                            // Expected non-neighbours of i in block l, i itself excluded.
                            let unlinked = sizes[l] - self.tau[(i, l)] - linked;

                            linked * ln_pi[(q, l)] + unlinked * ln_not_pi[(q, l)]
                        })
                        .sum::<f64>();
            }

            let row = normalise_log_weights(&logits);

            for (q, value) in row.into_iter().enumerate() {
                let old = self.tau[(i, q)];
                max_delta = max_delta.max((value - old).abs());
                sizes[q] += value - old;
                self.tau[(i, q)] = value;
            }
        }

        max_delta
    }

    /// Re-estimates the block proportions and the connectivity from the sufficient statistics.
    pub(crate) fn m_step(&mut self, stats: &BlockStats, epsilon: f64) {
        let blocks = self.blocks();
        let nodes = self.tau.nrows().max(1) as f64;

        let alpha = stats.sizes.transpose().map(|size| (size / nodes).max(epsilon));
        self.alpha = alpha.unscale(alpha.sum());

        self.degenerate.clear();
        for p in 0..blocks {
            for q in p..blocks {
                let pairs = stats.pairs[(p, q)];
                let estimate = if pairs > epsilon {
                    stats.edges[(p, q)] / pairs
                } else {
                    // No pair to estimate from, the entry is as pinned as it gets.
                    epsilon
                };

                if estimate <= epsilon || estimate >= 1.0 - epsilon {
                    self.degenerate.push((p, q));
                }

                let value = estimate.clamp(epsilon, 1.0 - epsilon);
                self.pi[(p, q)] = value;
                self.pi[(q, p)] = value;
            }
        }
    }

    /// The variational lower bound of the log-likelihood,
    /// `Σ_i Σ_q tau[i][q] (ln alpha[q] - ln tau[i][q]) + ½ Σ_{i≠j} Σ_{q,l} tau[i][q] tau[j][l] ln f(A[i][j]; pi[q][l])`.
    pub(crate) fn lower_bound(&self, stats: &BlockStats) -> f64 {
        let blocks = self.blocks();

        // 0 · ln 0 is taken as 0.
        let mut membership = 0.0;
        for row in self.tau.row_iter() {
            for (q, &t) in row.iter().enumerate() {
                if t > 0.0 {
                    membership += t * (self.alpha[q].ln() - t.ln());
                }
            }
        }

        let mut connectivity = 0.0;
        for p in 0..blocks {
            for q in 0..blocks {
                let pi = self.pi[(p, q)];
                let edges = stats.edges[(p, q)];
                let non_edges = stats.pairs[(p, q)] - edges;

                connectivity += edges * pi.ln() + non_edges * (1.0 - pi).ln();
            }
        }

        membership + 0.5 * connectivity
    }
}

/// Turns log weights into a distribution, shifting by the maximum so the largest weight is
/// exactly representable.
fn normalise_log_weights(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = weights.iter().sum();

    weights.into_iter().map(|w| w / total).collect()
}

/// Stopping rules of a run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RunOptions {
    pub(crate) max_iterations: usize,
    pub(crate) tolerance: f64,
    pub(crate) epsilon: f64,
    pub(crate) time_budget: Option<Duration>,
}

/// The best state reached by a run.
#[derive(Clone, Debug)]
pub(crate) struct RunOutcome {
    pub(crate) state: Variational,
    pub(crate) lower_bound: f64,
    pub(crate) iterations: usize,
    pub(crate) converged: bool,
}

/// Iterates E and M steps from an initial membership until no entry moves by more than the
/// tolerance, the iteration cap is hit or the time budget runs out.
pub(crate) fn run(adjacency: &DMatrix<f64>, tau: DMatrix<f64>, options: RunOptions) -> RunOutcome {
    let start = Instant::now();

    let mut state = Variational::new(adjacency, tau, options.epsilon);
    let mut best_bound = state.lower_bound(&BlockStats::new(adjacency, &state.tau));
    let mut best = state.clone();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < options.max_iterations {
        iterations += 1;

        let delta = state.e_step(adjacency);
        let stats = BlockStats::new(adjacency, &state.tau);
        state.m_step(&stats, options.epsilon);

        let bound = state.lower_bound(&stats);
        if bound >= best_bound {
            best_bound = bound;
            best = state.clone();
        }

        if delta < options.tolerance {
            converged = true;
            break;
        }

        if options
            .time_budget
            .map_or(false, |budget| start.elapsed() >= budget)
        {
            break;
        }
    }

    RunOutcome {
        state: best,
        lower_bound: best_bound,
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;
    use crate::sbm::init::soften;

    const EPSILON: f64 = 1e-10;

    fn adjacency(n: usize, edges: &[(usize, usize)]) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(n, n);
        for &(i, j) in edges {
            matrix[(i, j)] = 1.0;
            matrix[(j, i)] = 1.0;
        }

        matrix
    }

    /// Two 5-cliques, 0..5 and 5..10, joined by the edge 4 - 5.
    fn two_cliques() -> DMatrix<f64> {
        let mut edges: Vec<(usize, usize)> = (0..5).tuple_combinations().collect();
        edges.extend((5..10).tuple_combinations::<(usize, usize)>());
        edges.push((4, 5));

        adjacency(10, &edges)
    }

    fn options() -> RunOptions {
        RunOptions {
            max_iterations: 200,
            tolerance: 1e-6,
            epsilon: EPSILON,
            time_budget: None,
        }
    }

    #[test]
    fn block_stats_count_ordered_pairs() {
        let a = adjacency(3, &[(0, 1), (1, 2)]);
        let stats = BlockStats::new(&a, &DMatrix::from_element(3, 1, 1.0));

        // 2 edges seen from both ends, 3 · 2 ordered pairs.
        assert_eq!(stats.edges[(0, 0)], 4.0);
        assert_eq!(stats.pairs[(0, 0)], 6.0);
        assert_eq!(stats.sizes[0], 3.0);
    }

    #[test]
    fn m_step_on_hard_memberships() {
        let a = two_cliques();
        let labels: Vec<usize> = (0..10).map(|i| usize::from(i >= 5)).collect();
        let tau = DMatrix::from_fn(10, 2, |i, q| if labels[i] == q { 1.0 } else { 0.0 });

        let state = Variational::new(&a, tau, EPSILON);

        assert_eq!(state.alpha, DVector::from_vec(vec![0.5, 0.5]));
        assert_eq!(state.pi[(0, 1)], 1.0 / 25.0);
        assert_eq!(state.pi[(1, 0)], 1.0 / 25.0);
        // The cliques are complete, their density is pinned at the clip.
        assert_eq!(state.pi[(0, 0)], 1.0 - EPSILON);
        assert_eq!(state.degenerate, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn e_step_keeps_rows_stochastic() {
        let a = two_cliques();
        let labels = [0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
        let mut state = Variational::new(&a, soften(&labels, 3), EPSILON);

        state.e_step(&a);

        for row in state.tau.row_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|t| (0.0..=1.0).contains(t)));
        }
    }

    #[test]
    fn lower_bound_never_decreases() {
        let a = two_cliques();
        let labels = [0, 0, 1, 0, 1, 1, 0, 1, 1, 0];
        let mut state = Variational::new(&a, soften(&labels, 2), EPSILON);
        let mut bound = state.lower_bound(&BlockStats::new(&a, &state.tau));

        for _ in 0..20 {
            state.e_step(&a);
            let stats = BlockStats::new(&a, &state.tau);
            state.m_step(&stats, EPSILON);

            let next = state.lower_bound(&stats);
            assert!(next >= bound - 1e-9, "{next} < {bound}");
            bound = next;
        }
    }

    #[test]
    fn run_recovers_the_cliques() {
        let a = two_cliques();
        let labels = [0, 0, 0, 1, 0, 1, 1, 0, 1, 1];
        let outcome = run(&a, soften(&labels, 2), options());

        assert!(outcome.converged);

        let tau = &outcome.state.tau;
        let block_of = |i: usize| usize::from(tau[(i, 1)] > tau[(i, 0)]);
        assert!((0..5).all(|i| block_of(i) == block_of(0)));
        assert!((5..10).all(|i| block_of(i) == block_of(5)));
        assert_ne!(block_of(0), block_of(5));
    }

    #[test]
    fn run_reports_non_convergence() {
        let a = two_cliques();
        let labels = [0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
        let outcome = run(
            &a,
            soften(&labels, 2),
            RunOptions {
                max_iterations: 1,
                tolerance: 1e-300,
                ..options()
            },
        );

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.lower_bound.is_finite());
    }

    #[test]
    fn exhausted_time_budget_stops_the_run() {
        let a = two_cliques();
        let labels = [0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
        let outcome = run(
            &a,
            soften(&labels, 2),
            RunOptions {
                tolerance: 1e-300,
                time_budget: Some(Duration::ZERO),
                ..options()
            },
        );

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 1);
    }

    #[test]
    fn normalise_log_weights_handles_extremes() {
        let row = normalise_log_weights(&[-1000.0, 0.0, -1000.0]);

        assert_eq!(row, vec![0.0, 1.0, 0.0]);
        assert_eq!(normalise_log_weights(&[2.0, 2.0]), vec![0.5, 0.5]);
    }
}
