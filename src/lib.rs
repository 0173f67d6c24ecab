//! Anomalia - anomaly screening for financial spreadsheets
//!
//! Loads an Excel workbook of financial records, flags statistically
//! anomalous rows with two unsupervised outlier scorers, measures the result
//! against a 3-sigma heuristic ground truth, and exports the annotated
//! table.
//!
//! # Modules
//!
//! - [`loader`] - workbook reading and column cleaning
//! - [`preprocessing`] - standard scaling and matrix extraction
//! - [`anomaly`] - Isolation Forest, Local Outlier Factor and the screen
//! - [`evaluation`] - heuristic ground truth and classification metrics
//! - [`export`] - annotated-table workbook export
//! - [`report`] - derived data the presentation shell renders
//! - [`cli`] - terminal shell around the pipeline
//!
//! The core is stateless between runs: each function takes a table value and
//! returns a new one, and nothing survives a run except the exported file.

pub mod error;

pub mod anomaly;
pub mod evaluation;
pub mod export;
pub mod loader;
pub mod preprocessing;
pub mod report;

pub mod cli;

pub use error::{AnomaliaError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::anomaly::{
        detect, detect_with, IsolationForest, LocalOutlierFactor, OutlierModel, ScreenConfig,
        COL_DETECTED, COL_IF, COL_LOF, DEFAULT_CONTAMINATION, FLAG_COLUMNS,
    };
    pub use crate::error::{AnomaliaError, Result};
    pub use crate::evaluation::{evaluate, ConfusionMatrix, MetricsBundle, COL_TRUTH};
    pub use crate::export::{export_annotated, write_xlsx, EXPORT_FILENAME};
    pub use crate::loader::{load, EXCLUDED_COLUMNS};
    pub use crate::preprocessing::StandardScaler;
    pub use crate::report::{anomaly_count, detection_histogram, preview, ScreenSummary};
}
