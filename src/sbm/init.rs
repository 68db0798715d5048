//! Initial memberships of an EM run.

use nalgebra::DMatrix;
use rand::Rng;

use crate::graph::{laplacian_matrix, sorted_eigenvalue_vector_pairs};

/// Weight a softened hard assignment puts on the chosen block, before the uniform share.
const HARD_WEIGHT: f64 = 0.9;

const KMEANS_MAX_ITERATIONS: usize = 100;

/// Turns hard block labels into a row-stochastic membership matrix, `0.9 + 0.1 / K` on the
/// labelled block and `0.1 / K` on the others, so no block starts out impossible.
pub(crate) fn soften(labels: &[usize], blocks: usize) -> DMatrix<f64> {
    let uniform = (1.0 - HARD_WEIGHT) / blocks as f64;

    DMatrix::from_fn(labels.len(), blocks, |i, q| {
        if labels[i] == q {
            HARD_WEIGHT + uniform
        } else {
            uniform
        }
    })
}

/// Clusters the nodes on their adjacency rows, nodes sharing most of their neighbours landing in
/// the same block.
///
/// Uniformly random partitions are not used: they give every block the same connectivity after
/// the first M-step and the proportions term then merges all nodes into one block.
pub(crate) fn neighborhood_labels<R: Rng>(
    adjacency: &DMatrix<f64>,
    blocks: usize,
    rng: &mut R,
) -> Vec<usize> {
    if blocks <= 1 {
        return vec![0; adjacency.nrows()];
    }

    kmeans(adjacency, blocks, rng)
}

/// Clusters the nodes on the eigenvectors of the `blocks` smallest eigenvalues of the laplacian.
///
/// Nodes of a tightly knit group have near-identical coordinates in this embedding, k-means then
/// separates the groups.
pub(crate) fn spectral_labels<R: Rng>(
    adjacency: &DMatrix<f64>,
    blocks: usize,
    rng: &mut R,
) -> Vec<usize> {
    let nodes = adjacency.nrows();
    if blocks <= 1 || nodes == 0 {
        return vec![0; nodes];
    }

    let ascending = true;
    let pairs = sorted_eigenvalue_vector_pairs(laplacian_matrix(adjacency), ascending);

    let dims = blocks.min(pairs.len());
    let embedding = DMatrix::from_fn(nodes, dims, |i, d| pairs[d].1[i]);

    kmeans(&embedding, blocks, rng)
}

/// Lloyd's algorithm over the rows of `points` with k-means++ seeding.
pub(crate) fn kmeans<R: Rng>(points: &DMatrix<f64>, k: usize, rng: &mut R) -> Vec<usize> {
    let (n, d) = points.shape();
    if n == 0 || k == 0 {
        return vec![0; n];
    }

    let distance = |i: usize, centroids: &DMatrix<f64>, c: usize| -> f64 {
        (0..d)
            .map(|j| (points[(i, j)] - centroids[(c, j)]).powi(2))
            .sum()
    };

    // k-means++: the first centroid is drawn uniformly, the next ones with a probability
    // proportional to the squared distance to the nearest centroid chosen so far.
    let mut centroids = DMatrix::<f64>::zeros(k, d);
    let first = rng.gen_range(0..n);
    centroids.row_mut(0).copy_from(&points.row(first));

    let mut nearest = vec![f64::INFINITY; n];
    for c in 1..k {
        for (i, best) in nearest.iter_mut().enumerate() {
            *best = best.min(distance(i, &centroids, c - 1));
        }

        let total: f64 = nearest.iter().sum();
        let chosen = if total > f64::EPSILON {
            let threshold = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;

            nearest
                .iter()
                .position(|dist| {
                    cumulative += dist;
                    cumulative >= threshold
                })
                .unwrap_or(n - 1)
        } else {
            // Every point sits on a centroid already.
            rng.gen_range(0..n)
        };

        centroids.row_mut(c).copy_from(&points.row(chosen));
    }

    let mut labels = vec![0; n];
    for iteration in 0..KMEANS_MAX_ITERATIONS {
        let mut changed = false;

        for (i, label) in labels.iter_mut().enumerate() {
            let closest = (0..k)
                .map(|c| (c, distance(i, &centroids, c)))
                .min_by(|(_, a), (_, b)| a.total_cmp(b))
                .map_or(0, |(c, _)| c);

            if *label != closest {
                *label = closest;
                changed = true;
            }
        }

        if !changed && iteration > 0 {
            break;
        }

        // Empty clusters keep their centroid.
        let mut sums = DMatrix::<f64>::zeros(k, d);
        let mut counts = vec![0usize; k];
        for (i, &label) in labels.iter().enumerate() {
            for j in 0..d {
                sums[(label, j)] += points[(i, j)];
            }
            counts[label] += 1;
        }

        for (c, &count) in counts.iter().enumerate() {
            if count > 0 {
                let mean = sums.row(c) / count as f64;
                centroids.row_mut(c).copy_from(&mean);
            }
        }
    }

    labels
}
