//! Isolation Forest anomaly scoring

use crate::anomaly::{contamination_cutoff, labels_from_scores, OutlierModel};
use crate::error::{AnomaliaError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

const EULER_MASCHERONI: f64 = 0.577_215_664_9;

/// A single isolation tree
#[derive(Debug, Clone, Serialize, Deserialize)]
enum IsoTree {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        below: Box<IsoTree>,
        above: Box<IsoTree>,
    },
}

impl IsoTree {
    fn grow(
        x: &Array2<f64>,
        members: &[usize],
        depth: usize,
        limit: usize,
        rng: &mut StdRng,
    ) -> Self {
        if depth >= limit || members.len() <= 1 {
            return IsoTree::Leaf {
                size: members.len(),
            };
        }

        let feature = rng.gen_range(0..x.ncols());

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &i in members {
            let v = x[[i, feature]];
            lo = lo.min(v);
            hi = hi.max(v);
        }

        // All values equal on the chosen feature: nothing left to isolate
        if hi - lo < 1e-12 {
            return IsoTree::Leaf {
                size: members.len(),
            };
        }

        let threshold = rng.gen_range(lo..hi);
        let (below, above): (Vec<usize>, Vec<usize>) =
            members.iter().partition(|&&i| x[[i, feature]] < threshold);

        if below.is_empty() || above.is_empty() {
            return IsoTree::Leaf {
                size: members.len(),
            };
        }

        IsoTree::Split {
            feature,
            threshold,
            below: Box::new(Self::grow(x, &below, depth + 1, limit, rng)),
            above: Box::new(Self::grow(x, &above, depth + 1, limit, rng)),
        }
    }

    fn path_length(&self, sample: &[f64], depth: usize) -> f64 {
        match self {
            IsoTree::Leaf { size } => depth as f64 + expected_depth(*size),
            IsoTree::Split {
                feature,
                threshold,
                below,
                above,
            } => {
                if sample[*feature] < *threshold {
                    below.path_length(sample, depth + 1)
                } else {
                    above.path_length(sample, depth + 1)
                }
            }
        }
    }
}

/// Average depth of an unsuccessful search in a binary search tree of `n`
/// nodes: c(n) = 2·H(n−1) − 2(n−1)/n.
fn expected_depth(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Isolation Forest: isolates points by random recursive partitioning.
/// Points needing fewer partitions to isolate score as more anomalous.
///
/// Fitting is fully determined by the seed, so repeated runs on the same
/// matrix produce identical labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    n_trees: usize,
    max_samples: usize,
    contamination: f64,
    seed: u64,
    trees: Option<Vec<IsoTree>>,
    sample_size: usize,
    cutoff: Option<f64>,
}

impl IsolationForest {
    pub fn new() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
            trees: None,
            sample_size: 0,
            cutoff: None,
        }
    }

    pub fn with_n_trees(mut self, n: usize) -> Self {
        self.n_trees = n.max(1);
        self
    }

    pub fn with_contamination(mut self, c: f64) -> Self {
        self.contamination = c;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn fitted_trees(&self) -> Result<&[IsoTree]> {
        self.trees
            .as_deref()
            .ok_or_else(|| AnomaliaError::DataError("isolation forest used before fit".to_string()))
    }
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlierModel for IsolationForest {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(AnomaliaError::DataError(
                "cannot fit isolation forest on an empty matrix".to_string(),
            ));
        }

        let sample_size = self.max_samples.min(n);
        let depth_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut trees = Vec::with_capacity(self.n_trees);
        for _ in 0..self.n_trees {
            // Subsample with replacement
            let members: Vec<usize> = (0..sample_size).map(|_| rng.gen_range(0..n)).collect();
            trees.push(IsoTree::grow(x, &members, 0, depth_limit, &mut rng));
        }

        self.trees = Some(trees);
        self.sample_size = sample_size;

        let scores = self.scores(x)?;
        self.cutoff = contamination_cutoff(&scores, self.contamination);

        Ok(())
    }

    fn scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let trees = self.fitted_trees()?;
        let norm = expected_depth(self.sample_size);

        let scores: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let sample: Vec<f64> = row.iter().copied().collect();
                let mean_path: f64 = trees
                    .iter()
                    .map(|t| t.path_length(&sample, 0))
                    .sum::<f64>()
                    / trees.len() as f64;
                // s(x, n) = 2^(−E[h(x)] / c(n))
                2.0_f64.powf(-mean_path / norm)
            })
            .collect();

        Ok(Array1::from_vec(scores))
    }

    fn labels(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        self.fitted_trees()?;
        let scores = self.scores(x)?;
        Ok(labels_from_scores(&scores, self.cutoff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outliers() -> Array2<f64> {
        // 50 points in a tight grid plus two extremes
        let mut data = Vec::new();
        for i in 0..50 {
            data.push((i % 10) as f64);
            data.push(((i % 10) + 1) as f64);
        }
        data.extend_from_slice(&[100.0, 100.0]);
        data.extend_from_slice(&[-50.0, -50.0]);
        Array2::from_shape_vec((52, 2), data).unwrap()
    }

    #[test]
    fn test_outliers_score_highest() {
        let x = cluster_with_outliers();
        let mut forest = IsolationForest::new().with_contamination(0.05).with_seed(42);
        forest.fit(&x).unwrap();

        let scores = forest.scores(&x).unwrap();
        assert!(scores[50] > scores[0]);
        assert!(scores[51] > scores[0]);
    }

    #[test]
    fn test_contamination_bounds_flag_count() {
        let x = cluster_with_outliers();
        let mut forest = IsolationForest::new().with_contamination(0.05).with_seed(42);
        let labels = forest.fit_labels(&x).unwrap();

        // floor(0.05 * 52) = 2 flagged rows (barring exact score ties)
        let flagged = labels.iter().filter(|&&l| l == -1).count();
        assert_eq!(flagged, 2);
        assert_eq!(labels[50], -1);
        assert_eq!(labels[51], -1);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let x = cluster_with_outliers();

        let mut a = IsolationForest::new().with_contamination(0.1).with_seed(7);
        let mut b = IsolationForest::new().with_contamination(0.1).with_seed(7);

        assert_eq!(a.fit_labels(&x).unwrap(), b.fit_labels(&x).unwrap());
    }

    #[test]
    fn test_unfitted_scores_fail() {
        let x = cluster_with_outliers();
        let forest = IsolationForest::new();
        assert!(forest.scores(&x).is_err());
    }

    #[test]
    fn test_expected_depth_monotone() {
        assert_eq!(expected_depth(1), 0.0);
        assert_eq!(expected_depth(2), 1.0);
        assert!(expected_depth(100) > expected_depth(10));
    }
}
