//! Local Outlier Factor anomaly scoring

use crate::anomaly::{contamination_cutoff, labels_from_scores, OutlierModel};
use crate::error::{AnomaliaError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Local Outlier Factor: compares each point's local density to its k
/// nearest neighbors' densities. Points in sparser neighborhoods than their
/// neighbors score above 1 and rank as more anomalous.
///
/// Scoring is deterministic given fixed inputs; there is no randomness to
/// seed. In-sample labels come from the fit-time scores, where each point's
/// neighborhood excludes the point itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalOutlierFactor {
    n_neighbors: usize,
    contamination: f64,
    train: Option<Array2<f64>>,
    k_distances: Option<Vec<f64>>,
    lrd: Option<Vec<f64>>,
    train_scores: Option<Array1<f64>>,
    cutoff: Option<f64>,
}

impl LocalOutlierFactor {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            contamination: 0.1,
            train: None,
            k_distances: None,
            lrd: None,
            train_scores: None,
            cutoff: None,
        }
    }

    pub fn with_contamination(mut self, c: f64) -> Self {
        self.contamination = c;
        self
    }

    fn euclidean(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Indices and distances of the k nearest points in `data`, ascending by
    /// distance. `skip` excludes a point from its own neighborhood.
    fn nearest(point: &[f64], data: &Array2<f64>, k: usize, skip: Option<usize>) -> Vec<(usize, f64)> {
        let mut dists: Vec<(usize, f64)> = data
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .map(|(i, row)| {
                let other: Vec<f64> = row.iter().copied().collect();
                (i, Self::euclidean(point, &other))
            })
            .collect();

        dists.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        dists.truncate(k);
        dists
    }

    /// Local reachability density: k / Σ reach-dist, where the reachability
    /// distance to a neighbor is max(neighbor's k-distance, true distance).
    fn reachability_density(neighbors: &[(usize, f64)], k_distances: &[f64]) -> f64 {
        if neighbors.is_empty() {
            return 0.0;
        }

        let total: f64 = neighbors
            .iter()
            .map(|&(j, d)| k_distances[j].max(d))
            .sum();

        if total == 0.0 {
            // Point coincides with its whole neighborhood
            f64::INFINITY
        } else {
            neighbors.len() as f64 / total
        }
    }

    fn factor(lrd_point: f64, neighbors: &[(usize, f64)], lrd: &[f64]) -> f64 {
        if neighbors.is_empty() || lrd_point == 0.0 || !lrd_point.is_finite() {
            return 1.0;
        }

        let ratio_sum: f64 = neighbors.iter().map(|&(j, _)| lrd[j] / lrd_point).sum();
        ratio_sum / neighbors.len() as f64
    }

    fn fitted(&self) -> Result<(&Array2<f64>, &[f64], &[f64])> {
        match (&self.train, &self.k_distances, &self.lrd) {
            (Some(t), Some(kd), Some(l)) => Ok((t, kd, l)),
            _ => Err(AnomaliaError::DataError(
                "local outlier factor used before fit".to_string(),
            )),
        }
    }
}

impl OutlierModel for LocalOutlierFactor {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let n = x.nrows();
        if n < 2 {
            return Err(AnomaliaError::InsufficientRows {
                rows: n,
                required: 2,
            });
        }
        let k = self.n_neighbors.min(n - 1);

        let mut neighborhoods = Vec::with_capacity(n);
        let mut k_distances = Vec::with_capacity(n);
        for (i, row) in x.rows().into_iter().enumerate() {
            let point: Vec<f64> = row.iter().copied().collect();
            let neighbors = Self::nearest(&point, x, k, Some(i));
            k_distances.push(neighbors.iter().map(|&(_, d)| d).fold(0.0, f64::max));
            neighborhoods.push(neighbors);
        }

        let lrd: Vec<f64> = neighborhoods
            .iter()
            .map(|nb| Self::reachability_density(nb, &k_distances))
            .collect();

        let scores: Vec<f64> = (0..n)
            .map(|i| Self::factor(lrd[i], &neighborhoods[i], &lrd))
            .collect();
        let scores = Array1::from_vec(scores);

        self.cutoff = contamination_cutoff(&scores, self.contamination);
        self.train = Some(x.clone());
        self.k_distances = Some(k_distances);
        self.lrd = Some(lrd);
        self.train_scores = Some(scores);

        Ok(())
    }

    /// Score rows of `x` against the fitted data. Neighborhoods are drawn
    /// from the training matrix without self-exclusion, so in-sample labels
    /// should come from [`OutlierModel::fit_labels`] instead.
    fn scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (train, k_distances, lrd) = self.fitted()?;
        let k = self.n_neighbors.min(train.nrows() - 1);

        let scores: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let point: Vec<f64> = row.iter().copied().collect();
                let neighbors = Self::nearest(&point, train, k, None);
                let own_lrd = Self::reachability_density(&neighbors, k_distances);
                Self::factor(own_lrd, &neighbors, lrd)
            })
            .collect();

        Ok(Array1::from_vec(scores))
    }

    fn labels(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        let scores = self.scores(x)?;
        Ok(labels_from_scores(&scores, self.cutoff))
    }

    /// In-sample labels, thresholded from the fit-time scores.
    fn fit_labels(&mut self, x: &Array2<f64>) -> Result<Array1<i32>> {
        self.fit(x)?;
        let scores = self
            .train_scores
            .as_ref()
            .ok_or_else(|| AnomaliaError::DataError("missing fit-time scores".to_string()))?;
        Ok(labels_from_scores(scores, self.cutoff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outlier() -> Array2<f64> {
        let mut data = Vec::new();
        for i in 0..10 {
            data.push((i % 5) as f64 * 0.1);
            data.push(((i % 5) + 1) as f64 * 0.1);
        }
        data.extend_from_slice(&[50.0, 50.0]);
        Array2::from_shape_vec((11, 2), data).unwrap()
    }

    #[test]
    fn test_outlier_scores_above_cluster() {
        let x = cluster_with_outlier();
        let mut lof = LocalOutlierFactor::new(3).with_contamination(0.1);
        lof.fit(&x).unwrap();

        let scores = lof.train_scores.as_ref().unwrap();
        let cluster_mean: f64 = scores.iter().take(10).sum::<f64>() / 10.0;
        assert!(scores[10] > cluster_mean);
    }

    #[test]
    fn test_fit_labels_flags_outlier() {
        let x = cluster_with_outlier();
        let mut lof = LocalOutlierFactor::new(3).with_contamination(0.1);
        let labels = lof.fit_labels(&x).unwrap();

        // floor(0.1 * 11) = 1 flagged row, and it is the far point
        assert_eq!(labels[10], -1);
        assert_eq!(labels.iter().filter(|&&l| l == -1).count(), 1);
    }

    #[test]
    fn test_out_of_sample_scoring() {
        let x = cluster_with_outlier();
        let mut lof = LocalOutlierFactor::new(3).with_contamination(0.1);
        lof.fit(&x).unwrap();

        let probes = Array2::from_shape_vec((2, 2), vec![0.2, 0.3, 80.0, -40.0]).unwrap();
        let scores = lof.scores(&probes).unwrap();
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn test_deterministic_given_same_input() {
        let x = cluster_with_outlier();

        let mut a = LocalOutlierFactor::new(5).with_contamination(0.2);
        let mut b = LocalOutlierFactor::new(5).with_contamination(0.2);

        assert_eq!(a.fit_labels(&x).unwrap(), b.fit_labels(&x).unwrap());
    }

    #[test]
    fn test_unfitted_scores_fail() {
        let x = cluster_with_outlier();
        let lof = LocalOutlierFactor::new(3);
        assert!(lof.scores(&x).is_err());
    }
}
