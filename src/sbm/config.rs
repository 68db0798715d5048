//! Configuration of the block model estimator.

use std::{ops::RangeInclusive, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{error::SbmError, pool};

/// Configuration of the [`SbmEstimator`](super::SbmEstimator).
///
/// Every field has a default, so partial documents deserialize:
///
/// ```
/// use strata::sbm::SbmConfig;
///
/// let config: SbmConfig = serde_json::from_str(r#"{ "k_max": 4, "random_seed": 7 }"#).unwrap();
///
/// assert_eq!(config.k_max, Some(4));
/// assert_eq!(config.restarts, SbmConfig::default().restarts);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SbmConfig {
    /// Smallest block count evaluated, at least 1.
    pub k_min: usize,
    /// Largest block count evaluated, clamped to the node count. `None` picks
    /// `max(k_min, ceil(2 ln n))`.
    pub k_max: Option<usize>,
    /// EM runs per block count, the run with the best lower bound is kept.
    pub restarts: usize,
    /// Iteration cap of a single EM run.
    pub max_iterations: usize,
    /// A run has converged once no membership entry moves by more than this over a sweep.
    pub convergence_tolerance: f64,
    /// Connectivity estimates are clipped to `[epsilon, 1 - epsilon]` to keep their logarithms
    /// finite.
    pub epsilon: f64,
    /// Base seed of the restarts. `None` draws a fresh one per estimation.
    pub random_seed: Option<u64>,
    /// Seed every other restart, the first included, from the spectrum of the laplacian. The
    /// remaining restarts, or all of them when unset, cluster the adjacency rows.
    pub spectral_init: bool,
    /// Wall-clock budget of a single EM run. A run out of time stops with its best state so far.
    pub time_budget: Option<Duration>,
    /// Worker threads running the (block count, restart) fits. `None` uses the available
    /// parallelism.
    pub num_threads: Option<usize>,
}

impl Default for SbmConfig {
    fn default() -> Self {
        Self {
            k_min: 1,
            k_max: None,
            restarts: 10,
            max_iterations: 200,
            convergence_tolerance: 1e-6,
            epsilon: 1e-10,
            random_seed: None,
            spectral_init: true,
            time_budget: None,
            num_threads: None,
        }
    }
}

impl SbmConfig {
    /// Checks the configuration is usable.
    pub fn validate(&self) -> Result<(), SbmError> {
        if self.k_min == 0 {
            return Err(SbmError::InvalidConfig("k_min must be at least 1"));
        }

        if self.k_max.map_or(false, |k_max| k_max < self.k_min) {
            return Err(SbmError::InvalidConfig("k_max must not be below k_min"));
        }

        if self.restarts == 0 {
            return Err(SbmError::InvalidConfig("restarts must be at least 1"));
        }

        if self.max_iterations == 0 {
            return Err(SbmError::InvalidConfig("max_iterations must be at least 1"));
        }

        if !(self.convergence_tolerance > 0.0 && self.convergence_tolerance.is_finite()) {
            return Err(SbmError::InvalidConfig(
                "convergence_tolerance must be positive and finite",
            ));
        }

        if !(self.epsilon > 0.0 && self.epsilon < 0.5) {
            return Err(SbmError::InvalidConfig("epsilon must lie in (0, 0.5)"));
        }

        Ok(())
    }

    /// Returns the block counts evaluated for a graph of `nodes` nodes.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::sbm::SbmConfig;
    ///
    /// let config = SbmConfig::default();
    /// assert_eq!(config.block_range(10).unwrap(), 1..=5);
    ///
    /// let config = SbmConfig { k_max: Some(40), ..Default::default() };
    /// assert_eq!(config.block_range(10).unwrap(), 1..=10);
    /// ```
    pub fn block_range(&self, nodes: usize) -> Result<RangeInclusive<usize>, SbmError> {
        if nodes == 0 {
            return Err(SbmError::EmptyGraph);
        }

        if self.k_min > nodes {
            return Err(SbmError::TooFewNodes {
                nodes,
                k_min: self.k_min,
            });
        }

        let k_max = self
            .k_max
            .unwrap_or_else(|| heuristic_k_max(nodes).max(self.k_min));

        Ok(self.k_min..=k_max.min(nodes))
    }

    pub(crate) fn num_threads(&self) -> usize {
        self.num_threads
            .unwrap_or_else(pool::default_num_threads)
    }
}

/// `ceil(2 ln n)`, at least 1.
fn heuristic_k_max(nodes: usize) -> usize {
    let k = (2.0 * (nodes as f64).ln()).ceil();

    if k.is_finite() && k >= 1.0 {
        k as usize
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(SbmConfig::default().validate(), Ok(()));
    }

    #[test]
    fn invalid_configs() {
        let invalid = [
            SbmConfig {
                k_min: 0,
                ..Default::default()
            },
            SbmConfig {
                k_min: 3,
                k_max: Some(2),
                ..Default::default()
            },
            SbmConfig {
                restarts: 0,
                ..Default::default()
            },
            SbmConfig {
                max_iterations: 0,
                ..Default::default()
            },
            SbmConfig {
                convergence_tolerance: 0.0,
                ..Default::default()
            },
            SbmConfig {
                epsilon: 0.5,
                ..Default::default()
            },
            SbmConfig {
                epsilon: f64::NAN,
                ..Default::default()
            },
        ];

        for config in invalid {
            assert!(matches!(
                config.validate(),
                Err(SbmError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn block_range() {
        let config = SbmConfig::default();

        assert_eq!(config.block_range(0), Err(SbmError::EmptyGraph));
        assert_eq!(config.block_range(1).unwrap(), 1..=1);
        // ceil(2 ln 2) = 2.
        assert_eq!(config.block_range(2).unwrap(), 1..=2);
        // ceil(2 ln 34) = 8.
        assert_eq!(config.block_range(34).unwrap(), 1..=8);

        let config = SbmConfig {
            k_min: 3,
            ..Default::default()
        };
        assert_eq!(
            config.block_range(2),
            Err(SbmError::TooFewNodes { nodes: 2, k_min: 3 })
        );
        // The heuristic never falls below k_min.
        assert_eq!(config.block_range(3).unwrap(), 3..=3);
    }

    #[test]
    fn deserialize_partial() {
        let config: SbmConfig =
            serde_json::from_str(r#"{ "k_min": 2, "restarts": 3, "spectral_init": false }"#)
                .unwrap();

        assert_eq!(
            config,
            SbmConfig {
                k_min: 2,
                restarts: 3,
                spectral_init: false,
                ..Default::default()
            }
        );
    }

    #[test]
    fn serialize_round_trip() {
        let config = SbmConfig {
            random_seed: Some(42),
            time_budget: Some(Duration::from_millis(250)),
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<SbmConfig>(&json).unwrap(), config);
    }
}
