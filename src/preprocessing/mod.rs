//! Feature preparation for the outlier models
//!
//! Standardizes the cleaned table and converts it into the dense matrix the
//! scorers consume.

mod scaler;

pub use scaler::StandardScaler;

use crate::error::{AnomaliaError, Result};
use ndarray::Array2;
use polars::prelude::*;

/// Extract every column of `df` into a row-major `Array2<f64>`.
///
/// Columns are cast to `Float64` first, so integer features are accepted.
/// Column order follows the DataFrame.
pub fn to_feature_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = df.width();

    let col_data: Vec<Vec<f64>> = df
        .get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            let cast = series
                .cast(&DataType::Float64)
                .map_err(|e| AnomaliaError::DataError(e.to_string()))?;
            let values: Vec<f64> = cast
                .f64()
                .map_err(|e| AnomaliaError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_data[c][r]
    }))
}
