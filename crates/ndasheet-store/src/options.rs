//! Read-only access to the externally maintained options file.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::sources::open_source;
use crate::value::{CellValue, OptionRecord};

/// Reads the first sheet of an options file as header-keyed records
#[derive(Debug, Clone)]
pub struct OptionsReader {
    path: PathBuf,
}

impl OptionsReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One record per row below the header.
    ///
    /// A missing file yields no records. Columns past the header are ignored;
    /// blank or missing cells leave the field out of the record.
    pub fn read_all(&self) -> Result<Vec<OptionRecord>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "options file not found");
            return Ok(Vec::new());
        }

        let source = open_source(&self.path)?;
        let Some(sheet) = source.default_sheet() else {
            return Ok(Vec::new());
        };
        let rows = source.read_sheet(&sheet)?;

        let Some((header_row, data_rows)) = rows.split_first() else {
            return Ok(Vec::new());
        };
        let headers: Vec<String> = header_row.iter().map(|c| c.to_string()).collect();

        let options: Vec<OptionRecord> = data_rows
            .iter()
            .map(|row| zip_row(&headers, row))
            .collect();

        debug!(path = %self.path.display(), sheet = %sheet, count = options.len(), "read options");
        Ok(options)
    }
}

fn zip_row(headers: &[String], row: &[CellValue]) -> OptionRecord {
    headers
        .iter()
        .zip(row)
        .filter(|(header, value)| !header.is_empty() && **value != CellValue::Empty)
        .map(|(header, value)| (header.clone(), value.clone()))
        .collect()
}
