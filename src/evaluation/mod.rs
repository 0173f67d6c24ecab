//! Metric evaluation against the 3-sigma heuristic ground truth
//!
//! The heuristic labels a row as truly anomalous when any original feature
//! value exceeds its column mean plus three standard deviations. It is a
//! screening yardstick, not a claim about real fraud.

use crate::anomaly::{detected_flags, FLAG_COLUMNS};
use crate::error::{AnomaliaError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Heuristic ground-truth column appended by [`evaluate`]
pub const COL_TRUTH: &str = "Anomalia_Real";

/// 2×2 count table in `[[TN, FP], [FN, TP]]` layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    /// Row-major layout: negatives first, positives second
    pub fn rows(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }
}

/// Accuracy, precision and recall for one detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub confusion: ConfusionMatrix,
}

/// Score the detector's flags against the heuristic ground truth.
///
/// When the detector flagged nothing or everything the metrics are not
/// defined; the bundle comes back with all metrics at 0 and a diagonal
/// confusion matrix, and no ground truth is computed. Callers must not read
/// those zeros as a real evaluation.
///
/// In the regular case `Anomalia_Real` is appended to `df`; that is the only
/// mutation.
pub fn evaluate(df: &mut DataFrame) -> Result<MetricsBundle> {
    let detected = detected_flags(df)?;
    let n = detected.len();

    let anomalias = detected.iter().filter(|&&f| f == 1).count();
    let normais = n - anomalias;

    if anomalias == 0 || normais == 0 {
        warn!(
            anomalias,
            normais, "single-class detection result, metrics are not meaningful"
        );
        return Ok(MetricsBundle {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            confusion: ConfusionMatrix {
                tn: normais,
                fp: 0,
                fn_: 0,
                tp: anomalias,
            },
        });
    }

    let truth = ground_truth(df)?;
    df.with_column(Series::new(COL_TRUTH.into(), truth.clone()))?;

    let mut cm = ConfusionMatrix {
        tn: 0,
        fp: 0,
        fn_: 0,
        tp: 0,
    };
    for (&t, &p) in truth.iter().zip(detected.iter()) {
        match (t, p) {
            (0, 0) => cm.tn += 1,
            (0, _) => cm.fp += 1,
            (_, 0) => cm.fn_ += 1,
            _ => cm.tp += 1,
        }
    }

    let accuracy = (cm.tp + cm.tn) as f64 / n as f64;
    let precision = match cm.tp + cm.fp {
        0 => 0.0,
        d => cm.tp as f64 / d as f64,
    };
    let recall = match cm.tp + cm.fn_ {
        0 => 0.0,
        d => cm.tp as f64 / d as f64,
    };

    debug!(accuracy, precision, recall, "evaluation complete");

    Ok(MetricsBundle {
        accuracy,
        precision,
        recall,
        confusion: cm,
    })
}

/// Per-row heuristic label over the original feature columns (everything
/// except the flag columns and a previously appended truth column).
fn ground_truth(df: &DataFrame) -> Result<Vec<i32>> {
    let mut truth = vec![0i32; df.height()];

    for column in df.get_columns() {
        let name = column.name().as_str();
        if FLAG_COLUMNS.contains(&name) || name == COL_TRUTH {
            continue;
        }

        let series = column.as_materialized_series();
        let cast = series
            .cast(&DataType::Float64)
            .map_err(|e| AnomaliaError::DataError(e.to_string()))?;
        let ca = cast
            .f64()
            .map_err(|e| AnomaliaError::DataError(e.to_string()))?;

        let mean = ca.mean().unwrap_or(0.0);
        let std = ca.std(1).unwrap_or(0.0);
        let limit = mean + 3.0 * std;

        for (i, v) in ca.into_iter().enumerate() {
            if let Some(v) = v {
                if v > limit {
                    truth[i] = 1;
                }
            }
        }
    }

    Ok(truth)
}
