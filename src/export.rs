//! Export of the annotated table
//!
//! One boundary artifact per run: the cleaned table with its flag columns,
//! written to a fixed filename the presentation shell can offer for
//! download. Concurrent runs into the same directory overwrite each other;
//! that behavior is deliberate and unversioned.

use crate::error::Result;
use polars::prelude::*;
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed name of the exported workbook
pub const EXPORT_FILENAME: &str = "anomalias_detectadas.xlsx";

/// Write `df` as a single-sheet workbook at `path`.
///
/// Column order is preserved; every column is written numerically.
pub fn write_xlsx(df: &DataFrame, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (c, name) in df.get_column_names().iter().enumerate() {
        sheet.write_string(0, c as u16, name.as_str())?;
    }

    for (c, column) in df.get_columns().iter().enumerate() {
        let cast = column.as_materialized_series().cast(&DataType::Float64)?;
        let values = cast.f64()?;
        for (r, v) in values.into_iter().enumerate() {
            if let Some(v) = v {
                sheet.write_number((r + 1) as u32, c as u16, v)?;
            }
        }
    }

    workbook.save(path)?;
    info!(path = %path.display(), rows = df.height(), "annotated table exported");
    Ok(())
}

/// Write the annotated table into `dir` under [`EXPORT_FILENAME`] and return
/// the full path.
pub fn export_annotated(df: &DataFrame, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(EXPORT_FILENAME);
    write_xlsx(df, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;
    use tempfile::TempDir;

    #[test]
    fn test_export_roundtrips_through_loader() {
        let df = df!(
            "valor" => &[1.5, 2.5, 3.5],
            "saldo" => &[10.0, 20.0, 30.0],
        )
        .unwrap();

        let dir = TempDir::new().unwrap();
        let path = export_annotated(&df, dir.path()).unwrap();
        assert!(path.ends_with(EXPORT_FILENAME));

        let reloaded = loader::load(&path).unwrap();
        assert_eq!(reloaded.height(), 3);
        let names: Vec<String> = reloaded
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["valor", "saldo"]);

        let col = reloaded.column("valor").unwrap().f64().unwrap();
        assert_eq!(col.get(2), Some(3.5));
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();

        let first = df!("a" => &[1.0, 2.0]).unwrap();
        export_annotated(&first, dir.path()).unwrap();

        let second = df!("a" => &[9.0]).unwrap();
        let path = export_annotated(&second, dir.path()).unwrap();

        let reloaded = loader::load(&path).unwrap();
        assert_eq!(reloaded.height(), 1);
    }
}
