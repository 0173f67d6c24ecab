//! Unsupervised outlier scoring
//!
//! Two independent scorers share one labeling convention: -1 marks an
//! anomaly, 1 marks a normal row, and the contamination fraction decides how
//! many of the highest-scoring rows receive -1.

mod isolation_forest;
mod lof;
mod screen;

pub use isolation_forest::IsolationForest;
pub use lof::LocalOutlierFactor;
pub use screen::{
    detect, detect_with, detected_flags, ScreenConfig, COL_DETECTED, COL_IF, COL_LOF,
    DEFAULT_CONTAMINATION, FLAG_COLUMNS,
};

use crate::error::Result;
use ndarray::{Array1, Array2};
use std::cmp::Ordering;

/// Trait for outlier scoring models
pub trait OutlierModel {
    /// Fit the model on the scaled feature matrix
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Anomaly scores for `x` (higher = more anomalous)
    fn scores(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Raw labels for `x`: -1 anomaly, 1 normal
    fn labels(&self, x: &Array2<f64>) -> Result<Array1<i32>>;

    /// Fit on `x` and label the same rows
    fn fit_labels(&mut self, x: &Array2<f64>) -> Result<Array1<i32>> {
        self.fit(x)?;
        self.labels(x)
    }
}

/// Decision cutoff for a contamination fraction.
///
/// Returns the score of the `⌊contamination · n⌋`-th highest-scoring sample,
/// or `None` when that count is zero (nothing gets flagged). Rows scoring at
/// or above the cutoff are anomalies, so ties at the cutoff are all flagged.
pub(crate) fn contamination_cutoff(scores: &Array1<f64>, contamination: f64) -> Option<f64> {
    let n = scores.len();
    let flagged = (contamination * n as f64).floor() as usize;
    if flagged == 0 {
        return None;
    }

    let mut sorted: Vec<f64> = scores.iter().copied().collect();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    Some(sorted[flagged.min(n) - 1])
}

/// Apply a cutoff to scores: -1 at or above the cutoff, 1 below.
pub(crate) fn labels_from_scores(scores: &Array1<f64>, cutoff: Option<f64>) -> Array1<i32> {
    match cutoff {
        Some(c) => scores.mapv(|s| if s >= c { -1 } else { 1 }),
        None => Array1::from_elem(scores.len(), 1),
    }
}
