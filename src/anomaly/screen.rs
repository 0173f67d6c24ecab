//! Full outlier screen over a cleaned table
//!
//! Scales the features, runs both scorers on the same matrix, and appends
//! the three flag columns to the input table.

use crate::anomaly::{IsolationForest, LocalOutlierFactor, OutlierModel};
use crate::error::{AnomaliaError, Result};
use crate::preprocessing::{to_feature_matrix, StandardScaler};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Isolation Forest raw label column (-1 anomaly, 1 normal)
pub const COL_IF: &str = "Anomalia_IF";
/// Local Outlier Factor raw label column (-1 anomaly, 1 normal)
pub const COL_LOF: &str = "Anomalia_LOF";
/// Unioned flag column (1 iff either raw label is -1)
pub const COL_DETECTED: &str = "Anomalia_Detectada";
/// The three columns appended by [`detect`], in order
pub const FLAG_COLUMNS: [&str; 3] = [COL_IF, COL_LOF, COL_DETECTED];

/// Expected proportion of anomalous rows. Fixed by design, not exposed for
/// user configuration.
pub const DEFAULT_CONTAMINATION: f64 = 0.10;

/// Screen parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Expected anomaly fraction, must lie in (0, 0.5)
    pub contamination: f64,
    /// Neighborhood size for the density scorer
    pub n_neighbors: usize,
    /// Ensemble size for the isolation scorer
    pub n_trees: usize,
    /// Seed for the isolation scorer
    pub seed: u64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            n_neighbors: 5,
            n_trees: 100,
            seed: 42,
        }
    }
}

impl ScreenConfig {
    pub fn with_contamination(mut self, c: f64) -> Self {
        self.contamination = c;
        self
    }

    /// Minimum row count for neighbor-based scoring
    pub fn required_rows(&self) -> usize {
        self.n_neighbors + 1
    }
}

/// Run the outlier screen with the default configuration at the given
/// contamination fraction.
pub fn detect(df: &DataFrame, contamination: f64) -> Result<DataFrame> {
    detect_with(df, &ScreenConfig::default().with_contamination(contamination))
}

/// Run the outlier screen.
///
/// Returns the input table with [`FLAG_COLUMNS`] appended. The input is not
/// modified. Fails with [`AnomaliaError::EmptyFeatureSet`] on a table with
/// no columns, [`AnomaliaError::InsufficientRows`] below k+1 rows, and
/// [`AnomaliaError::InvalidParameter`] for a contamination outside (0, 0.5).
pub fn detect_with(df: &DataFrame, config: &ScreenConfig) -> Result<DataFrame> {
    let c = config.contamination;
    if !(c > 0.0 && c < 0.5) {
        return Err(AnomaliaError::InvalidParameter {
            name: "contamination".to_string(),
            value: c.to_string(),
            reason: "must lie in the open interval (0, 0.5)".to_string(),
        });
    }

    if df.width() == 0 {
        return Err(AnomaliaError::EmptyFeatureSet);
    }

    let required = config.required_rows();
    if df.height() < required {
        return Err(AnomaliaError::InsufficientRows {
            rows: df.height(),
            required,
        });
    }

    let scaled = StandardScaler::new().fit_transform(df)?;
    let x = to_feature_matrix(&scaled)?;

    let mut forest = IsolationForest::new()
        .with_n_trees(config.n_trees)
        .with_contamination(c)
        .with_seed(config.seed);
    let if_labels = forest.fit_labels(&x)?;

    let mut lof = LocalOutlierFactor::new(config.n_neighbors).with_contamination(c);
    let lof_labels = lof.fit_labels(&x)?;

    let union: Vec<i32> = if_labels
        .iter()
        .zip(lof_labels.iter())
        .map(|(&a, &b)| i32::from(a == -1 || b == -1))
        .collect();
    let n_flagged = union.iter().filter(|&&f| f == 1).count();

    let mut out = df.clone();
    out.with_column(Series::new(COL_IF.into(), if_labels.to_vec()))?;
    out.with_column(Series::new(COL_LOF.into(), lof_labels.to_vec()))?;
    out.with_column(Series::new(COL_DETECTED.into(), union))?;

    info!(
        rows = out.height(),
        anomalies = n_flagged,
        contamination = c,
        "outlier screen complete"
    );

    Ok(out)
}

/// Read the unioned flag column from an annotated table.
pub fn detected_flags(df: &DataFrame) -> Result<Vec<i32>> {
    let column = df
        .column(COL_DETECTED)
        .map_err(|_| AnomaliaError::FeatureNotFound(COL_DETECTED.to_string()))?;
    let flags = column
        .as_materialized_series()
        .i32()
        .map_err(|e| AnomaliaError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or(0))
        .collect();
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_noise_table() -> DataFrame {
        // 18 rows of small distinct values plus 2 rows pinned at 100
        let col = |offset: f64| -> Vec<f64> {
            let mut v: Vec<f64> = (0..18).map(|i| i as f64 * 0.01 + offset).collect();
            v.push(100.0);
            v.push(100.0);
            v
        };
        df!(
            "valor" => col(0.0),
            "saldo" => col(0.001),
            "taxa" => col(0.002),
        )
        .unwrap()
    }

    #[test]
    fn test_detect_flags_extreme_rows_only() {
        let df = small_noise_table();
        let out = detect(&df, 0.10).unwrap();

        let flags = detected_flags(&out).unwrap();
        assert_eq!(flags.len(), 20);
        for (i, &f) in flags.iter().enumerate() {
            if i >= 18 {
                assert_eq!(f, 1, "extreme row {i} must be flagged");
            } else {
                assert_eq!(f, 0, "normal row {i} must not be flagged");
            }
        }
    }

    #[test]
    fn test_union_matches_raw_labels() {
        let df = small_noise_table();
        let out = detect(&df, 0.10).unwrap();

        let get = |name: &str| -> Vec<i32> {
            out.column(name)
                .unwrap()
                .as_materialized_series()
                .i32()
                .unwrap()
                .into_iter()
                .map(|v| v.unwrap())
                .collect()
        };
        let iso = get(COL_IF);
        let lof = get(COL_LOF);
        let union = get(COL_DETECTED);

        for i in 0..out.height() {
            assert!(iso[i] == -1 || iso[i] == 1);
            assert!(lof[i] == -1 || lof[i] == 1);
            let expected = i32::from(iso[i] == -1 || lof[i] == -1);
            assert_eq!(union[i], expected);
        }
    }

    #[test]
    fn test_detect_is_idempotent() {
        let df = small_noise_table();
        let a = detect(&df, 0.10).unwrap();
        let b = detect(&df, 0.10).unwrap();

        assert!(a.equals(&b));
    }

    #[test]
    fn test_detect_preserves_input_columns() {
        let df = small_noise_table();
        let out = detect(&df, 0.10).unwrap();

        let names: Vec<String> = out
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["valor", "saldo", "taxa", COL_IF, COL_LOF, COL_DETECTED]
        );
        assert_eq!(out.height(), df.height());
        // input untouched
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_detect_rejects_empty_feature_set() {
        let df = DataFrame::empty();
        let err = detect(&df, 0.10).unwrap_err();
        assert!(matches!(err, AnomaliaError::EmptyFeatureSet));
    }

    #[test]
    fn test_detect_rejects_short_tables() {
        let df = df!("v" => &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let err = detect(&df, 0.10).unwrap_err();
        assert!(matches!(
            err,
            AnomaliaError::InsufficientRows {
                rows: 4,
                required: 6
            }
        ));
    }

    #[test]
    fn test_detect_rejects_out_of_range_contamination() {
        let df = small_noise_table();
        for c in [0.0, 0.5, -0.1, 0.9] {
            let err = detect(&df, c).unwrap_err();
            assert!(matches!(err, AnomaliaError::InvalidParameter { .. }));
        }
    }
}
