//! Data source implementations.
//!
//! Adapters that load tabular files (Excel, CSV) into rows of [`CellValue`].

pub mod csv;
pub mod excel;

use std::path::Path;

pub use self::csv::{CsvOptions, CsvSource};
pub use excel::ExcelSource;

use crate::error::Result;
use crate::value::CellValue;

/// Trait for data sources that can provide tabular data
pub trait DataSource {
    /// Read every populated row of a sheet, starting at row 1 / column A.
    ///
    /// Trailing blank cells of each row and trailing blank rows are dropped;
    /// blank cells inside a row are kept as [`CellValue::Empty`].
    fn read_sheet(&self, sheet: &str) -> Result<Vec<Vec<CellValue>>>;

    /// List available sheets/tables in the source
    fn list_sheets(&self) -> Result<Vec<String>>;

    /// Get the default (first) sheet name
    fn default_sheet(&self) -> Option<String>;
}

/// Open the source matching a file's extension
pub fn open_source(path: &Path) -> Result<Box<dyn DataSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("csv") => Ok(Box::new(CsvSource::with_options(
            path,
            CsvOptions::flexible(),
        )?)),
        Some("tsv") => Ok(Box::new(CsvSource::with_options(
            path,
            CsvOptions {
                flexible: true,
                ..CsvOptions::tsv()
            },
        )?)),
        _ => Ok(Box::new(ExcelSource::new(path)?)),
    }
}

/// Drop trailing blank cells and trailing blank rows
pub(crate) fn trim_grid(mut rows: Vec<Vec<CellValue>>) -> Vec<Vec<CellValue>> {
    for row in rows.iter_mut() {
        while matches!(row.last(), Some(CellValue::Empty)) {
            row.pop();
        }
    }
    while matches!(rows.last(), Some(row) if row.is_empty()) {
        rows.pop();
    }
    rows
}
