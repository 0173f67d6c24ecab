//! Standard (z-score) feature scaling

use crate::error::{AnomaliaError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-column parameters captured during fit
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnStats {
    mean: f64,
    std: f64,
}

/// Standardizes every column to zero mean and unit variance.
///
/// Columns with zero variance keep a scale of 1, which maps every value to 0
/// (each value equals the column mean). The transform therefore never
/// produces NaN.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: HashMap<String, ColumnStats>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit mean and standard deviation (ddof = 1) for every column of `df`.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.params.clear();

        for column in df.get_columns() {
            let name = column.name().to_string();
            let ca = cast_f64(column.as_materialized_series())?;

            let mean = ca.mean().unwrap_or(0.0);
            let std = ca.std(1).unwrap_or(0.0);

            self.params.insert(
                name,
                ColumnStats {
                    mean,
                    std: if std == 0.0 { 1.0 } else { std },
                },
            );
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform `df` using the fitted parameters.
    ///
    /// Every fitted column present in `df` is replaced by its scaled version;
    /// the result keeps the input column order.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(AnomaliaError::DataError(
                "scaler used before fit".to_string(),
            ));
        }

        let mut result = df.clone();
        for column in df.get_columns() {
            let Some(stats) = self.params.get(column.name().as_str()) else {
                continue;
            };

            let ca = cast_f64(column.as_materialized_series())?;
            let scaled: Float64Chunked = ca
                .into_iter()
                .map(|opt| opt.map(|v| (v - stats.mean) / stats.std))
                .collect();

            result.with_column(scaled.with_name(column.name().clone()).into_series())?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }
}

fn cast_f64(series: &Series) -> Result<Float64Chunked> {
    let cast = series
        .cast(&DataType::Float64)
        .map_err(|e| AnomaliaError::DataError(e.to_string()))?;
    cast.f64()
        .map_err(|e| AnomaliaError::DataError(e.to_string()))
        .map(|ca| ca.clone())
}
