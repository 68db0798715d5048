//! Bernoulli stochastic block model estimation.
//!
//! Every node belongs to one of `K` latent blocks and an edge between nodes of blocks `p` and `q`
//! is an independent Bernoulli draw with probability `pi[p][q]`. The [`SbmEstimator`] fits the
//! model with variational EM for every block count of a range, with several restarts each, and
//! selects the block count by the Integrated Completed Likelihood.
//!
//! # Examples
//!
//! ```
//! use strata::edge::Edge;
//! use strata::graph::Graph;
//! use strata::sbm::{SbmConfig, SbmEstimator};
//!
//! // Two triangles joined by the edge 2 - 3.
//! let graph = Graph::new(
//!     6,
//!     [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3)].map(Edge::from),
//! )
//! .unwrap();
//!
//! let config = SbmConfig {
//!     k_max: Some(3),
//!     random_seed: Some(7),
//!     ..Default::default()
//! };
//! let report = SbmEstimator::new(config).unwrap().estimate(&graph).unwrap();
//!
//! assert_eq!(report.fits().len(), 3);
//! assert!(report.selected().icl().is_finite());
//! ```

mod config;
mod icl;
mod init;
mod variational;

use std::{iter, ops::RangeInclusive};

use nalgebra::{DMatrix, DVector};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tracing::{debug, instrument};

pub use self::config::SbmConfig;
use self::variational::{RunOptions, RunOutcome};
use crate::{
    error::{Notice, SbmError},
    graph::{Graph, NodeId},
    pool,
};

/// The retained fit for one block count.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SbmFit {
    blocks: usize,
    membership: DMatrix<f64>,
    connectivity: DMatrix<f64>,
    proportions: DVector<f64>,
    assignment: Vec<usize>,
    lower_bound: f64,
    icl: f64,
    iterations: usize,
    converged: bool,
    restart: usize,
    seed: u64,
    degenerate: Vec<(usize, usize)>,
}

impl SbmFit {
    fn new(adjacency: &DMatrix<f64>, restart: usize, outcome: RunOutcome, seed: u64) -> Self {
        let RunOutcome {
            state,
            lower_bound,
            iterations,
            converged,
        } = outcome;

        let assignment = icl::block_assignment(&state.tau);
        let icl = icl::icl(adjacency, &assignment, &state.alpha, &state.pi);

        Self {
            blocks: state.blocks(),
            membership: state.tau,
            connectivity: state.pi,
            proportions: state.alpha,
            assignment,
            lower_bound,
            icl,
            iterations,
            converged,
            restart,
            seed,
            degenerate: state.degenerate,
        }
    }

    /// The number of blocks `K`.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// The `n × K` membership matrix, row `i` being the posterior block distribution of node `i`.
    pub fn membership(&self) -> &DMatrix<f64> {
        &self.membership
    }

    /// The symmetric `K × K` connectivity matrix.
    pub fn connectivity(&self) -> &DMatrix<f64> {
        &self.connectivity
    }

    /// The block proportions.
    pub fn proportions(&self) -> &DVector<f64> {
        &self.proportions
    }

    /// The block of each node, the column of its largest membership.
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    /// The variational lower bound of the retained restart.
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn icl(&self) -> f64 {
        self.icl
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// The index of the retained restart.
    pub fn restart(&self) -> usize {
        self.restart
    }

    /// The base seed the restarts were derived from. Passing it back as
    /// [`SbmConfig::random_seed`] reproduces the fit.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Connectivity entries `(p, q)`, `p <= q`, pinned at the clip boundary.
    pub fn degenerate(&self) -> &[(usize, usize)] {
        &self.degenerate
    }

    /// The number of nodes assigned to each block.
    pub fn block_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.blocks];
        for &block in &self.assignment {
            sizes[block] += 1;
        }

        sizes
    }

    /// The nodes assigned to `block`, in ascending order.
    pub fn block_members(&self, block: usize) -> Vec<NodeId> {
        self.assignment
            .iter()
            .enumerate()
            .filter_map(|(node, &b)| (b == block).then_some(node))
            .collect()
    }

    /// The notices of the retained restart.
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();

        if !self.converged {
            notices.push(Notice::NonConvergence {
                blocks: self.blocks,
                restart: self.restart,
                iterations: self.iterations,
            });
        }

        notices.extend(self.degenerate_notices());
        notices
    }

    fn degenerate_notices(&self) -> impl Iterator<Item = Notice> + '_ {
        self.degenerate.iter().map(|&(p, q)| Notice::DegenerateBlock {
            blocks: self.blocks,
            p,
            q,
            value: self.connectivity[(p, q)],
        })
    }
}

/// The outcome of an estimation: a fit per block count and the selected one.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SbmReport {
    fits: Vec<SbmFit>,
    selected: usize,
    seed: u64,
    notices: Vec<Notice>,
}

impl SbmReport {
    /// The fit with the largest ICL, the smaller block count winning ties.
    pub fn selected(&self) -> &SbmFit {
        &self.fits[self.selected]
    }

    /// The selected block count.
    pub fn blocks(&self) -> usize {
        self.selected().blocks()
    }

    /// The block assignment of the selected fit.
    pub fn assignment(&self) -> &[usize] {
        self.selected().assignment()
    }

    /// The fit for `blocks` blocks, if that count was evaluated.
    pub fn fit(&self, blocks: usize) -> Option<&SbmFit> {
        self.fits.iter().find(|fit| fit.blocks == blocks)
    }

    /// Every fit, by ascending block count.
    pub fn fits(&self) -> &[SbmFit] {
        &self.fits
    }

    /// The base seed the restarts were derived from. Passing it back as
    /// [`SbmConfig::random_seed`] reproduces the report.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Every restart that did not converge, followed by the degenerate entries of the retained
    /// fits.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

/// Fits block models over a range of block counts and selects one.
#[derive(Clone, Debug)]
pub struct SbmEstimator {
    config: SbmConfig,
}

impl SbmEstimator {
    /// Creates an estimator, validating the configuration.
    pub fn new(config: SbmConfig) -> Result<Self, SbmError> {
        config.validate()?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &SbmConfig {
        &self.config
    }

    /// Fits the graph's adjacency matrix, see [`SbmEstimator::estimate_adjacency`].
    #[instrument(skip_all, fields(nodes = graph.node_count()))]
    pub fn estimate(&self, graph: &Graph) -> Result<SbmReport, SbmError> {
        if graph.node_count() == 0 {
            return Err(SbmError::EmptyGraph);
        }

        self.estimate_validated(&graph.adjacency_matrix())
    }

    /// Fits every block count of [`SbmConfig::block_range`] and selects the one with the largest
    /// ICL.
    ///
    /// The adjacency matrix must be square and symmetric with 0/1 entries and a zero diagonal.
    #[instrument(skip_all, fields(nodes = adjacency.nrows()))]
    pub fn estimate_adjacency(&self, adjacency: &DMatrix<f64>) -> Result<SbmReport, SbmError> {
        validate_adjacency(adjacency)?;

        self.estimate_validated(adjacency)
    }

    /// Fits exactly `blocks` blocks, keeping the restart with the best lower bound.
    pub fn fit_blocks(&self, adjacency: &DMatrix<f64>, blocks: usize) -> Result<SbmFit, SbmError> {
        validate_adjacency(adjacency)?;

        let nodes = adjacency.nrows();
        if blocks == 0 {
            return Err(SbmError::InvalidConfig("block count must be at least 1"));
        }

        if blocks > nodes {
            return Err(SbmError::TooFewNodes {
                nodes,
                k_min: blocks,
            });
        }

        let seed = self.seed();
        let (mut fits, _) = self.fit_range(adjacency, blocks..=blocks, seed);

        // The range holds a single block count.
        Ok(fits.remove(0))
    }

    fn estimate_validated(&self, adjacency: &DMatrix<f64>) -> Result<SbmReport, SbmError> {
        let range = self.config.block_range(adjacency.nrows())?;
        let seed = self.seed();

        let (fits, mut notices) = self.fit_range(adjacency, range, seed);

        // Fits are ordered by block count, a strict comparison keeps the smaller count on ties.
        let mut selected = 0;
        for (index, fit) in fits.iter().enumerate() {
            if fit.icl > fits[selected].icl {
                selected = index;
            }
        }

        notices.extend(fits.iter().flat_map(SbmFit::degenerate_notices));

        debug!(
            blocks = fits[selected].blocks,
            icl = fits[selected].icl,
            seed = seed,
            "selected block count"
        );

        Ok(SbmReport {
            fits,
            selected,
            seed,
            notices,
        })
    }

    fn seed(&self) -> u64 {
        self.config.random_seed.unwrap_or_else(rand::random)
    }

    /// Runs every (block count, restart) pair on the worker pool and keeps the best restart per
    /// block count. Returns the fits by ascending block count and a notice per restart that did
    /// not converge.
    fn fit_range(
        &self,
        adjacency: &DMatrix<f64>,
        range: RangeInclusive<usize>,
        seed: u64,
    ) -> (Vec<SbmFit>, Vec<Notice>) {
        // A single block has a single possible partition, restarting is pointless.
        let tasks: Vec<(usize, usize)> = range
            .clone()
            .flat_map(|blocks| {
                let restarts = if blocks == 1 { 1 } else { self.config.restarts };
                (0..restarts).map(move |restart| (blocks, restart))
            })
            .collect();

        let options = RunOptions {
            max_iterations: self.config.max_iterations,
            tolerance: self.config.convergence_tolerance,
            epsilon: self.config.epsilon,
            time_budget: self.config.time_budget,
        };

        let mut outcomes: Vec<(usize, RunOutcome)> = pool::run(
            tasks.len(),
            self.config.num_threads(),
            Vec::new,
            |index, acc: &mut Vec<(usize, RunOutcome)>| {
                let (blocks, restart) = tasks[index];
                acc.push((index, self.run_restart(adjacency, blocks, restart, seed, options)));
            },
        )
        .into_iter()
        .flatten()
        .collect();

        outcomes.sort_unstable_by_key(|(index, _)| *index);

        let mut notices = Vec::new();
        let mut fits: Vec<SbmFit> = Vec::with_capacity(range.clone().count());
        let mut outcomes = outcomes.into_iter().peekable();

        for blocks in range {
            let restarts = iter::from_fn(|| {
                outcomes.next_if(|(index, _)| tasks[*index].0 == blocks)
            })
            .map(|(index, outcome)| {
                let restart = tasks[index].1;

                if !outcome.converged {
                    debug!(
                        blocks = blocks,
                        restart = restart,
                        iterations = outcome.iterations,
                        "restart did not converge"
                    );
                    notices.push(Notice::NonConvergence {
                        blocks,
                        restart,
                        iterations: outcome.iterations,
                    });
                }

                (restart, outcome)
            });

            if let Some((restart, outcome)) = best_restart(restarts) {
                fits.push(self.finish(adjacency, restart, outcome, seed));
            }
        }

        (fits, notices)
    }

    fn finish(
        &self,
        adjacency: &DMatrix<f64>,
        restart: usize,
        outcome: RunOutcome,
        seed: u64,
    ) -> SbmFit {
        let fit = SbmFit::new(adjacency, restart, outcome, seed);

        debug!(
            blocks = fit.blocks,
            restart = fit.restart,
            lower_bound = fit.lower_bound,
            icl = fit.icl,
            iterations = fit.iterations,
            converged = fit.converged,
            "fitted block count"
        );

        for &(p, q) in &fit.degenerate {
            debug!(blocks = fit.blocks, p = p, q = q, "degenerate connectivity");
        }

        fit
    }

    fn run_restart(
        &self,
        adjacency: &DMatrix<f64>,
        blocks: usize,
        restart: usize,
        seed: u64,
        options: RunOptions,
    ) -> RunOutcome {
        let mut rng = StdRng::seed_from_u64(restart_seed(seed, blocks, restart));

        // Even restarts cluster the laplacian embedding, odd ones the adjacency rows, each with
        // its own k-means++ draw.
        let labels = if self.config.spectral_init && restart % 2 == 0 {
            init::spectral_labels(adjacency, blocks, &mut rng)
        } else {
            init::neighborhood_labels(adjacency, blocks, &mut rng)
        };

        variational::run(adjacency, init::soften(&labels, blocks), options)
    }
}

/// Keeps the restart with the largest lower bound, the earliest one on ties.
fn best_restart<I>(restarts: I) -> Option<(usize, RunOutcome)>
where
    I: IntoIterator<Item = (usize, RunOutcome)>,
{
    restarts
        .into_iter()
        .fold(None, |best, (restart, outcome)| match best {
            Some((kept, current)) if current.lower_bound >= outcome.lower_bound => {
                Some((kept, current))
            }
            _ => Some((restart, outcome)),
        })
}

/// Derives the seed of one restart, so every restart draws the same numbers regardless of the
/// worker running it.
fn restart_seed(seed: u64, blocks: usize, restart: usize) -> u64 {
    seed ^ (blocks as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (restart as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

fn validate_adjacency(adjacency: &DMatrix<f64>) -> Result<(), SbmError> {
    if !adjacency.is_square() {
        return Err(SbmError::InvalidAdjacency("matrix is not square"));
    }

    let nodes = adjacency.nrows();
    if nodes == 0 {
        return Err(SbmError::EmptyGraph);
    }

    for i in 0..nodes {
        if adjacency[(i, i)] != 0.0 {
            return Err(SbmError::InvalidAdjacency("diagonal is not zero"));
        }

        for j in (i + 1)..nodes {
            let value = adjacency[(i, j)];

            if value != 0.0 && value != 1.0 {
                return Err(SbmError::InvalidAdjacency("entries are not 0 or 1"));
            }

            if value != adjacency[(j, i)] {
                return Err(SbmError::InvalidAdjacency("matrix is not symmetric"));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use nalgebra::dmatrix;
    use proptest::prelude::*;
    use rand::Rng;

    use super::*;
    use crate::{edge::Edge, sbm::variational::Variational};

    fn two_cliques() -> Graph {
        let edges = (0..5)
            .tuple_combinations::<(usize, usize)>()
            .chain((5..10).tuple_combinations())
            .chain([(4, 5)])
            .map(|(a, b)| Edge::new(a, b));

        Graph::new(10, edges).unwrap()
    }

    /// `blocks` groups of `size` nodes, linked with probability `p` within a group and `q`
    /// across.
    fn planted(blocks: usize, size: usize, p: f64, q: f64, seed: u64) -> DMatrix<f64> {
        let n = blocks * size;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut adjacency = DMatrix::zeros(n, n);

        for (i, j) in (0..n).tuple_combinations::<(usize, usize)>() {
            let link = if i / size == j / size { p } else { q };
            if rng.gen_bool(link) {
                adjacency[(i, j)] = 1.0;
                adjacency[(j, i)] = 1.0;
            }
        }

        adjacency
    }

    fn outcome(lower_bound: f64) -> RunOutcome {
        RunOutcome {
            state: Variational {
                tau: DMatrix::from_element(2, 1, 1.0),
                alpha: DVector::from_element(1, 1.0),
                pi: DMatrix::from_element(1, 1, 0.5),
                degenerate: Vec::new(),
            },
            lower_bound,
            iterations: 1,
            converged: true,
        }
    }

    fn seeded(seed: u64) -> SbmConfig {
        SbmConfig {
            random_seed: Some(seed),
            restarts: 4,
            ..Default::default()
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SbmConfig {
            restarts: 0,
            ..Default::default()
        };

        assert!(matches!(
            SbmEstimator::new(config),
            Err(SbmError::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_adjacency() {
        let estimator = SbmEstimator::new(SbmConfig::default()).unwrap();

        let cases = [
            DMatrix::<f64>::zeros(2, 3),
            dmatrix![1.0, 0.0; 0.0, 0.0],
            dmatrix![0.0, 0.5; 0.5, 0.0],
            dmatrix![0.0, 1.0; 0.0, 0.0],
        ];

        for adjacency in cases {
            assert!(matches!(
                estimator.estimate_adjacency(&adjacency),
                Err(SbmError::InvalidAdjacency(_))
            ));
        }
    }

    #[test]
    fn empty_graph() {
        let estimator = SbmEstimator::new(SbmConfig::default()).unwrap();

        assert_eq!(
            estimator.estimate(&Graph::new(0, Vec::<Edge>::new()).unwrap()),
            Err(SbmError::EmptyGraph)
        );
        assert_eq!(
            estimator.estimate_adjacency(&DMatrix::zeros(0, 0)),
            Err(SbmError::EmptyGraph)
        );
    }

    #[test]
    fn too_few_nodes() {
        let config = SbmConfig {
            k_min: 4,
            ..Default::default()
        };
        let estimator = SbmEstimator::new(config).unwrap();
        let graph = Graph::new(3, [Edge::new(0, 1)]).unwrap();

        assert_eq!(
            estimator.estimate(&graph),
            Err(SbmError::TooFewNodes { nodes: 3, k_min: 4 })
        );
    }

    #[test]
    fn estimation_is_idempotent_under_a_seed() {
        let graph = two_cliques();
        let estimator = SbmEstimator::new(seeded(17)).unwrap();

        let first = estimator.estimate(&graph).unwrap();
        let second = estimator.estimate(&graph).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.seed(), 17);
    }

    #[test]
    fn thread_count_does_not_change_the_report() {
        let graph = two_cliques();

        let reports: Vec<SbmReport> = [1, 3, 8]
            .into_iter()
            .map(|threads| {
                let config = SbmConfig {
                    num_threads: Some(threads),
                    ..seeded(5)
                };

                SbmEstimator::new(config).unwrap().estimate(&graph).unwrap()
            })
            .collect();

        assert_eq!(reports[0], reports[1]);
        assert_eq!(reports[0], reports[2]);
    }

    #[test]
    fn selected_fit_maximises_icl() {
        let report = SbmEstimator::new(seeded(3))
            .unwrap()
            .estimate(&two_cliques())
            .unwrap();

        // ceil(2 ln 10) = 5.
        assert_eq!(
            report.fits().iter().map(SbmFit::blocks).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );

        for fit in report.fits() {
            assert!(fit.icl().is_finite());
            assert!(fit.icl() <= report.selected().icl());
        }

        assert_eq!(report.blocks(), 2);
        assert_eq!(report.selected().block_sizes(), vec![5, 5]);
        assert_eq!(report.fit(2), Some(report.selected()));
        assert_eq!(report.fit(6), None);
    }

    #[test]
    fn fit_blocks() {
        let estimator = SbmEstimator::new(seeded(11)).unwrap();
        let adjacency = two_cliques().adjacency_matrix();

        let fit = estimator.fit_blocks(&adjacency, 2).unwrap();
        let members = fit.block_members(fit.assignment()[0]);

        assert_eq!(fit.blocks(), 2);
        assert_eq!(members, vec![0, 1, 2, 3, 4]);
        assert!(fit.converged());

        // Symmetric connectivity, proportions summing to one.
        assert_eq!(fit.connectivity(), &fit.connectivity().transpose());
        assert!((fit.proportions().sum() - 1.0).abs() < 1e-12);

        assert_eq!(
            estimator.fit_blocks(&adjacency, 11),
            Err(SbmError::TooFewNodes {
                nodes: 10,
                k_min: 11
            })
        );
        assert!(matches!(
            estimator.fit_blocks(&adjacency, 0),
            Err(SbmError::InvalidConfig(_))
        ));
    }

    #[test]
    fn single_block_has_a_single_restart() {
        let config = SbmConfig {
            k_max: Some(1),
            ..seeded(1)
        };
        let report = SbmEstimator::new(config)
            .unwrap()
            .estimate(&two_cliques())
            .unwrap();

        let fit = report.selected();
        assert_eq!(fit.blocks(), 1);
        assert_eq!(fit.restart(), 0);
        // 21 edges over 45 pairs.
        assert!((fit.connectivity()[(0, 0)] - 21.0 / 45.0).abs() < 1e-9);
    }

    #[test]
    fn non_convergence_is_a_notice() {
        let config = SbmConfig {
            k_min: 2,
            k_max: Some(2),
            max_iterations: 1,
            convergence_tolerance: 1e-300,
            spectral_init: false,
            ..seeded(2)
        };
        let report = SbmEstimator::new(config)
            .unwrap()
            .estimate(&two_cliques())
            .unwrap();

        let non_converged = report
            .notices()
            .iter()
            .filter(|notice| matches!(notice, Notice::NonConvergence { blocks: 2, .. }))
            .count();

        assert_eq!(non_converged, 4);
        assert!(!report.selected().converged());
        assert!(report
            .selected()
            .notices()
            .iter()
            .any(|notice| matches!(notice, Notice::NonConvergence { .. })));
    }

    #[test]
    fn degenerate_blocks_are_reported() {
        // Complete cliques pin their within-block density at the clip.
        let report = SbmEstimator::new(seeded(9))
            .unwrap()
            .estimate(&two_cliques())
            .unwrap();

        assert!(report.notices().iter().any(|notice| matches!(
            notice,
            Notice::DegenerateBlock { blocks: 2, .. }
        )));
    }

    #[test]
    fn restart_seeds_differ() {
        let seeds: Vec<u64> = (1..4)
            .cartesian_product(0..4)
            .map(|(blocks, restart)| restart_seed(42, blocks, restart))
            .collect();

        assert!(seeds.iter().all_unique());
    }

    #[test]
    fn best_restart_keeps_the_largest_bound() {
        let restarts = vec![(0, outcome(-10.0)), (1, outcome(-4.0)), (2, outcome(-7.0))];
        let (kept, best) = best_restart(restarts).unwrap();

        assert_eq!(kept, 1);
        assert_eq!(best.lower_bound, -4.0);

        // Ties keep the earliest restart.
        let restarts = vec![(0, outcome(-3.0)), (1, outcome(-3.0))];
        assert_eq!(best_restart(restarts).map(|(kept, _)| kept), Some(0));

        assert!(best_restart(Vec::<(usize, RunOutcome)>::new()).is_none());
    }

    #[test]
    fn cliques_are_found_without_spectral_seeding() {
        let graph = two_cliques();

        for seed in 0..5 {
            let config = SbmConfig {
                spectral_init: false,
                ..seeded(seed)
            };
            let report = SbmEstimator::new(config).unwrap().estimate(&graph).unwrap();
            let assignment = report.assignment();

            assert_eq!(report.blocks(), 2);
            assert!((0..5).all(|node| assignment[node] == assignment[0]));
            assert!((5..10).all(|node| assignment[node] == assignment[5]));
            assert_ne!(assignment[0], assignment[5]);
        }
    }

    #[test]
    fn restarts_do_not_collapse_into_one_block() {
        let mut kept_later_restart = false;

        for seed in 0..16 {
            let adjacency = planted(3, 15, 0.5, 0.05, seed);
            let config = SbmConfig {
                spectral_init: false,
                restarts: 6,
                ..seeded(seed)
            };
            let estimator = SbmEstimator::new(config).unwrap();

            let fit = estimator.fit_blocks(&adjacency, 3).unwrap();
            let single = estimator.fit_blocks(&adjacency, 1).unwrap();

            assert!(fit.block_sizes().iter().all(|size| *size > 0));
            assert!(fit.lower_bound() > single.lower_bound());

            kept_later_restart |= fit.restart() != 0;
        }

        // Some fit kept a restart other than the first.
        assert!(kept_later_restart);
    }

    #[test]
    fn fit_records_its_seed() {
        let adjacency = two_cliques().adjacency_matrix();
        let config = SbmConfig {
            restarts: 3,
            ..Default::default()
        };
        let fit = SbmEstimator::new(config.clone())
            .unwrap()
            .fit_blocks(&adjacency, 2)
            .unwrap();

        let replay = SbmEstimator::new(SbmConfig {
            random_seed: Some(fit.seed()),
            ..config
        })
        .unwrap()
        .fit_blocks(&adjacency, 2)
        .unwrap();

        assert_eq!(replay, fit);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn memberships_are_row_stochastic(
            edges in prop::collection::vec((0usize..12, 0usize..12), 0..40),
            seed in any::<u64>(),
        ) {
            let graph = Graph::new(
                12,
                edges.into_iter().filter(|(a, b)| a != b).map(Edge::from),
            )
            .unwrap();

            let config = SbmConfig {
                k_max: Some(3),
                restarts: 2,
                ..seeded(seed)
            };
            let report = SbmEstimator::new(config).unwrap().estimate(&graph).unwrap();

            for fit in report.fits() {
                prop_assert!(fit.icl().is_finite());

                for row in fit.membership().row_iter() {
                    prop_assert!((row.sum() - 1.0).abs() < 1e-9);
                }
            }
        }
    }
}
