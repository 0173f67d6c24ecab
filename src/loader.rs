//! Spreadsheet loading and column cleaning
//!
//! Reads the first sheet of an Excel workbook into a [`DataFrame`] holding
//! only the numeric feature columns. Identifier columns are removed by name,
//! every other non-numeric column is dropped, and row order and count are
//! preserved exactly.

use crate::error::{AnomaliaError, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Identifier columns removed during cleaning. Absence is not an error.
pub const EXCLUDED_COLUMNS: [&str; 4] = ["Key", "Type", "OBU", "Sum of Type"];

/// Load a workbook and return the cleaned table.
///
/// The first row of the sheet is taken as the header. A column survives
/// cleaning when it is not in [`EXCLUDED_COLUMNS`] and every one of its data
/// cells is an integer or floating-point value. A table with zero surviving
/// columns is returned as-is; detection rejects it later with
/// [`AnomaliaError::EmptyFeatureSet`].
pub fn load(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();

    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| AnomaliaError::UnreadableFile(format!("{}: {e}", path.display())))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            AnomaliaError::UnreadableFile(format!("{}: workbook has no sheets", path.display()))
        })?
        .map_err(|e| AnomaliaError::UnreadableFile(format!("{}: {e}", path.display())))?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells.iter().map(header_name).collect(),
        None => {
            return Err(AnomaliaError::UnreadableFile(format!(
                "{}: sheet is empty",
                path.display()
            )))
        }
    };

    let data_rows: Vec<&[Data]> = rows.collect();

    let mut columns: Vec<Column> = Vec::new();
    for (idx, name) in header.iter().enumerate() {
        if EXCLUDED_COLUMNS.contains(&name.as_str()) {
            debug!(column = %name, "dropping excluded identifier column");
            continue;
        }

        match numeric_column(&data_rows, idx) {
            Some(values) => columns.push(Column::new(name.as_str().into(), values)),
            None => debug!(column = %name, "dropping non-numeric column"),
        }
    }

    let df = DataFrame::new(columns)?;

    // Columns are built one value per data row, so the height can only
    // disagree when the table has no columns at all.
    debug_assert!(df.width() == 0 || df.height() == data_rows.len());

    info!(
        rows = data_rows.len(),
        features = df.width(),
        path = %path.display(),
        "workbook loaded and cleaned"
    );

    Ok(df)
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Extract column `idx` as f64 values, or `None` when any cell is non-numeric.
fn numeric_column(rows: &[&[Data]], idx: usize) -> Option<Vec<f64>> {
    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        let cell = row.get(idx).unwrap_or(&Data::Empty);
        match cell {
            Data::Int(v) => values.push(*v as f64),
            Data::Float(v) => values.push(*v),
            _ => return None,
        }
    }
    Some(values)
}
