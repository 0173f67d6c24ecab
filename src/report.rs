//! Data contracts consumed by the presentation shell
//!
//! The shell renders a preview of the cleaned table, the anomaly count, a
//! two-bin histogram and the metrics bundle. Everything here is derived,
//! read-only data; rendering itself stays outside the core.

use crate::anomaly::detected_flags;
use crate::error::Result;
use crate::evaluation::MetricsBundle;
use polars::prelude::*;
use serde::Serialize;

/// One bar of the detection histogram
#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    pub label: &'static str,
    pub count: usize,
}

/// Frequency of the unioned flag over its two values.
///
/// Bin order is fixed: `Normal` (flag 0) first, `Anomalia` (flag 1) second.
pub fn detection_histogram(df: &DataFrame) -> Result<[HistogramBin; 2]> {
    let flags = detected_flags(df)?;
    let anomalias = flags.iter().filter(|&&f| f == 1).count();

    Ok([
        HistogramBin {
            label: "Normal",
            count: flags.len() - anomalias,
        },
        HistogramBin {
            label: "Anomalia",
            count: anomalias,
        },
    ])
}

/// Number of rows the screen flagged as anomalous
pub fn anomaly_count(df: &DataFrame) -> Result<usize> {
    let flags = detected_flags(df)?;
    Ok(flags.iter().filter(|&&f| f == 1).count())
}

/// Head-of-table preview for display
pub fn preview(df: &DataFrame, rows: usize) -> DataFrame {
    df.head(Some(rows))
}

/// Everything the shell needs to render one run, JSON-serializable
#[derive(Debug, Clone, Serialize)]
pub struct ScreenSummary {
    pub rows: usize,
    pub features: usize,
    pub anomalies: usize,
    pub metrics: MetricsBundle,
    pub histogram: Vec<HistogramBin>,
    pub export_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{COL_DETECTED, COL_IF, COL_LOF};

    fn annotated() -> DataFrame {
        df!(
            "valor" => &[1.0, 2.0, 3.0, 100.0],
            COL_IF => &[1i32, 1, 1, -1],
            COL_LOF => &[1i32, 1, 1, -1],
            COL_DETECTED => &[0i32, 0, 0, 1],
        )
        .unwrap()
    }

    #[test]
    fn test_histogram_bins_and_order() {
        let df = annotated();
        let bins = detection_histogram(&df).unwrap();

        assert_eq!(bins[0].label, "Normal");
        assert_eq!(bins[0].count, 3);
        assert_eq!(bins[1].label, "Anomalia");
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins[0].count + bins[1].count, df.height());
    }

    #[test]
    fn test_anomaly_count() {
        let df = annotated();
        assert_eq!(anomaly_count(&df).unwrap(), 1);
    }

    #[test]
    fn test_preview_truncates() {
        let df = annotated();
        assert_eq!(preview(&df, 2).height(), 2);
        assert_eq!(preview(&df, 10).height(), 4);
    }
}
