//! Excel/XLSX data source using calamine.

use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Range, Reader, Xlsx, XlsxError};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::sources::{trim_grid, DataSource};
use crate::value::CellValue;

/// Excel workbook data source
pub struct ExcelSource {
    /// Path to the Excel file
    path: PathBuf,
    /// Sheet names cache, in workbook order
    sheet_names: Vec<String>,
}

impl ExcelSource {
    /// Create a new Excel source from a file path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(StoreError::persistence(
                path,
                IoError::new(ErrorKind::NotFound, "workbook not found"),
            ));
        }

        let workbook: Xlsx<_> = open_workbook(&path)
            .map_err(|e: XlsxError| StoreError::Workbook(format!("{}: {}", path.display(), e)))?;

        let sheet_names = workbook.sheet_names().to_vec();

        Ok(Self { path, sheet_names })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the workbook has a sheet with this exact name
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet_names.iter().any(|s| s == name)
    }

    /// Convert a calamine cell to a value
    fn cell_value(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Error(e) => CellValue::Text(format!("#ERROR: {:?}", e)),
            Data::DateTime(dt) => {
                if dt.is_duration() {
                    CellValue::Number(dt.as_f64())
                } else {
                    CellValue::from_excel_serial(dt.as_f64())
                        .unwrap_or(CellValue::Number(dt.as_f64()))
                }
            }
            Data::DateTimeIso(s) => CellValue::Text(s.clone()),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }

    /// Extract every cell from A1 to the range's last cell.
    ///
    /// calamine ranges start at the first populated cell, so positions are
    /// looked up absolutely to keep row 1 as row 1.
    fn extract_grid(sheet_range: &Range<Data>) -> Vec<Vec<CellValue>> {
        let Some((end_row, end_col)) = sheet_range.end() else {
            return Vec::new();
        };

        (0..=end_row)
            .map(|row_idx| {
                (0..=end_col)
                    .map(|col_idx| {
                        sheet_range
                            .get_value((row_idx, col_idx))
                            .map(Self::cell_value)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

impl DataSource for ExcelSource {
    fn read_sheet(&self, sheet: &str) -> Result<Vec<Vec<CellValue>>> {
        // Re-open workbook for reading (calamine requires this pattern)
        let mut workbook: Xlsx<_> = open_workbook(&self.path)
            .map_err(|e: XlsxError| StoreError::Workbook(format!("{}: {}", self.path.display(), e)))?;

        let sheet_range = workbook
            .worksheet_range(sheet)
            .map_err(|e| StoreError::Workbook(format!("{}: {}", sheet, e)))?;

        let rows = trim_grid(Self::extract_grid(&sheet_range));
        debug!(
            path = %self.path.display(),
            sheet,
            rows = rows.len(),
            "read sheet"
        );
        Ok(rows)
    }

    fn list_sheets(&self) -> Result<Vec<String>> {
        Ok(self.sheet_names.clone())
    }

    fn default_sheet(&self) -> Option<String> {
        self.sheet_names.first().cloned()
    }
}
