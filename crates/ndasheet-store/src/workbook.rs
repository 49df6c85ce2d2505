//! In-memory workbook used for read-modify-write cycles.
//!
//! A workbook is loaded whole through calamine, edited, and written back
//! whole through rust_xlsxwriter. Only cell values and date number formats
//! survive the round trip.

use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::sources::{DataSource, ExcelSource};
use crate::value::{CellValue, DATETIME_FORMAT, DATE_DISPLAY_FORMAT, DEFAULT_DATE_FORMAT};

/// A cell value plus its optional number format
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub num_format: Option<String>,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            num_format: None,
        }
    }

    /// Cell loaded from disk. calamine does not report number formats, so
    /// dates get the display format this store writes.
    fn loaded(value: CellValue) -> Self {
        let num_format = match value {
            CellValue::Date(_) => Some(DATE_DISPLAY_FORMAT.to_string()),
            _ => None,
        };
        Self { value, num_format }
    }
}

impl From<CellValue> for Cell {
    fn from(value: CellValue) -> Self {
        Cell::new(value)
    }
}

/// One named worksheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    /// Rows from row 1 down; a row may be shorter than its neighbours
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Number of populated rows, header included
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Header cells as text; empty when the sheet has no rows
    pub fn headers(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.iter().map(|c| c.value.to_string()).collect())
            .unwrap_or_default()
    }

    /// Column of the first header cell equal to `name`, ignoring padding
    pub fn header_column(&self, name: &str) -> Option<usize> {
        self.rows
            .first()?
            .iter()
            .position(|c| c.value.to_string().trim() == name)
    }

    /// Rows after the header
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row)?.get_mut(col)
    }
}

/// All sheets of one file, in workbook order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every sheet of an existing file
    pub fn load(path: &Path) -> Result<Self> {
        let source = ExcelSource::new(path)?;
        let mut sheets = Vec::new();

        for name in source.list_sheets()? {
            let rows = source
                .read_sheet(&name)?
                .into_iter()
                .map(|row| row.into_iter().map(Cell::loaded).collect())
                .collect();
            sheets.push(Sheet { name, rows });
        }

        debug!(path = %path.display(), sheets = sheets.len(), "loaded workbook");
        Ok(Self { sheets })
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Append a new, empty sheet and return it
    pub fn add_sheet(&mut self, name: impl Into<String>) -> &mut Sheet {
        self.sheets.push(Sheet::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    /// The named sheet, appended empty if the workbook lacks it
    pub fn sheet_or_add(&mut self, name: &str) -> &mut Sheet {
        match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => &mut self.sheets[idx],
            None => {
                debug!(sheet = name, "adding sheet");
                self.add_sheet(name)
            }
        }
    }

    /// Serialize the workbook to XLSX bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut xlsx = XlsxWorkbook::new();

        for sheet in &self.sheets {
            let worksheet = xlsx.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            for (row_idx, row) in sheet.rows.iter().enumerate() {
                let row_num = u32::try_from(row_idx).map_err(|_| {
                    StoreError::Workbook(format!("too many rows in '{}'", sheet.name))
                })?;
                for (col_idx, cell) in row.iter().enumerate() {
                    let col_num = u16::try_from(col_idx).map_err(|_| {
                        StoreError::Workbook(format!("too many columns in '{}'", sheet.name))
                    })?;
                    match &cell.value {
                        CellValue::Empty => {}
                        CellValue::Bool(b) => {
                            worksheet.write_boolean(row_num, col_num, *b)?;
                        }
                        CellValue::Number(n) => match &cell.num_format {
                            Some(fmt) => {
                                let format = Format::new().set_num_format(fmt);
                                worksheet.write_number_with_format(row_num, col_num, *n, &format)?;
                            }
                            None => {
                                worksheet.write_number(row_num, col_num, *n)?;
                            }
                        },
                        CellValue::Text(s) => {
                            worksheet.write_string(row_num, col_num, s)?;
                        }
                        date @ (CellValue::Date(_) | CellValue::DateTime(_)) => {
                            let Some(serial) = date.excel_serial() else {
                                worksheet.write_string(row_num, col_num, date.to_string())?;
                                continue;
                            };
                            let fallback = match date {
                                CellValue::Date(_) => DEFAULT_DATE_FORMAT,
                                _ => DATETIME_FORMAT,
                            };
                            let fmt = cell.num_format.as_deref().unwrap_or(fallback);
                            let format = Format::new().set_num_format(fmt);
                            worksheet.write_number_with_format(row_num, col_num, serial, &format)?;
                        }
                    }
                }
            }
        }

        Ok(xlsx.save_to_buffer()?)
    }

    /// Write the whole workbook to `path`.
    ///
    /// Bytes go to a temporary file in the same directory, which then
    /// replaces `path`, so readers never see a half-written file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::persistence(dir, e))?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StoreError::persistence(tmp.path(), e))?;
        tmp.persist(path)
            .map_err(|e| StoreError::persistence(path, e.error))?;

        debug!(path = %path.display(), bytes = bytes.len(), "saved workbook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn text(s: &str) -> Cell {
        Cell::new(CellValue::from(s))
    }

    #[test]
    fn test_sheet_headers_and_data_rows() {
        let mut sheet = Sheet::new("T");
        assert!(sheet.headers().is_empty());
        assert!(sheet.data_rows().is_empty());

        sheet.push_row(vec![text("Name"), text(" Date ")]);
        sheet.push_row(vec![text("Acme")]);

        assert_eq!(sheet.headers(), vec!["Name", " Date "]);
        assert_eq!(sheet.header_column("Date"), Some(1));
        assert_eq!(sheet.data_rows().len(), 1);
        assert!(sheet.cell_mut(1, 1).is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();

        let mut workbook = Workbook::new();
        let sheet = workbook.add_sheet("Main");
        sheet.push_row(vec![text("A"), text("B"), text("C")]);
        sheet.push_row(vec![
            Cell::new(CellValue::Number(1.5)),
            Cell::default(),
            Cell {
                value: CellValue::Date(date),
                num_format: Some(DATE_DISPLAY_FORMAT.to_string()),
            },
        ]);
        workbook.add_sheet("Other").push_row(vec![text("kept")]);
        workbook.save(&path).unwrap();

        let loaded = Workbook::load(&path).unwrap();
        assert_eq!(loaded.sheets().len(), 2);

        let main = loaded.sheet("Main").unwrap();
        assert_eq!(main.headers(), vec!["A", "B", "C"]);
        let row = &main.data_rows()[0];
        assert_eq!(row[0].value, CellValue::Number(1.5));
        assert_eq!(row[1].value, CellValue::Empty);
        assert_eq!(row[2].value, CellValue::Date(date));

        let other = loaded.sheet("Other").unwrap();
        assert_eq!(other.rows[0][0].value, CellValue::from("kept"));
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");

        let mut first = Workbook::new();
        first.add_sheet("S").push_row(vec![text("one")]);
        first.save(&path).unwrap();

        let mut second = Workbook::new();
        second.add_sheet("S").push_row(vec![text("two")]);
        second.save(&path).unwrap();

        let loaded = Workbook::load(&path).unwrap();
        assert_eq!(loaded.sheet("S").unwrap().rows[0][0].value, CellValue::from("two"));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("book.xlsx");

        let mut workbook = Workbook::new();
        workbook.add_sheet("S");
        let err = workbook.save(&path).unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
    }
}
