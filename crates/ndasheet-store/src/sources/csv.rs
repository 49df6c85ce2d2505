//! CSV data source.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::sources::{trim_grid, DataSource};
use crate::value::CellValue;

/// Name reported for the single sheet of a CSV file
pub const CSV_SHEET_NAME: &str = "data";

/// Options for CSV parsing
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Whether to trim whitespace from fields
    pub trim: bool,
    /// Whether to allow rows with differing column counts
    pub flexible: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            trim: true,
            flexible: false,
        }
    }
}

impl CsvOptions {
    /// Create options for tab-separated values (TSV)
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    /// Comma-separated, tolerating short and long rows
    pub fn flexible() -> Self {
        Self {
            flexible: true,
            ..Default::default()
        }
    }
}

/// CSV file data source
pub struct CsvSource {
    /// Path to the CSV file
    path: PathBuf,
    /// Parsing options
    options: CsvOptions,
}

impl CsvSource {
    /// Create a new CSV source from a file path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, CsvOptions::default())
    }

    /// Create a new CSV source with custom options
    pub fn with_options(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(StoreError::persistence(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "csv file not found"),
            ));
        }

        Ok(Self { path, options })
    }

    /// Read all records as raw strings, header included
    pub fn read_all(&self) -> Result<Vec<Vec<String>>> {
        let file = File::open(&self.path).map_err(|e| StoreError::persistence(&self.path, e))?;
        let reader = BufReader::new(file);

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .has_headers(false) // Header inference is up to the caller
            .trim(if self.options.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .flexible(self.options.flexible)
            .from_reader(reader);

        let mut result = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            result.push(record.iter().map(|s| s.to_string()).collect());
        }

        Ok(result)
    }
}

impl DataSource for CsvSource {
    fn read_sheet(&self, _sheet: &str) -> Result<Vec<Vec<CellValue>>> {
        // CSV has exactly one sheet, so the name is ignored
        let rows = self
            .read_all()?
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|s| {
                        if s.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::Text(s)
                        }
                    })
                    .collect()
            })
            .collect();
        Ok(trim_grid(rows))
    }

    fn list_sheets(&self) -> Result<Vec<String>> {
        Ok(vec![CSV_SHEET_NAME.to_string()])
    }

    fn default_sheet(&self) -> Option<String> {
        Some(CSV_SHEET_NAME.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_csv_read_all() {
        let file = create_test_csv("Name,Address\nAcme,1 Main St\nGlobex,2 Side Rd\n");

        let source = CsvSource::new(file.path()).unwrap();
        let data = source.read_all().unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data[0], vec!["Name", "Address"]);
        assert_eq!(data[1], vec!["Acme", "1 Main St"]);
    }

    #[test]
    fn test_csv_read_sheet_blank_cells() {
        let file = create_test_csv("A,B,C\n1,,3\n4,,\n");

        let source = CsvSource::new(file.path()).unwrap();
        let rows = source.read_sheet(CSV_SHEET_NAME).unwrap();

        assert_eq!(rows[1][1], CellValue::Empty);
        assert_eq!(rows[1][2], CellValue::from("3"));
        assert_eq!(rows[2], vec![CellValue::from("4")]);
    }

    #[test]
    fn test_csv_flexible_rows() {
        let file = create_test_csv("A,B,C\n1\n1,2,3,4\n");

        assert!(CsvSource::new(file.path()).unwrap().read_all().is_err());

        let source = CsvSource::with_options(file.path(), CsvOptions::flexible()).unwrap();
        let data = source.read_all().unwrap();
        assert_eq!(data[1].len(), 1);
        assert_eq!(data[2].len(), 4);
    }

    #[test]
    fn test_csv_tsv() {
        let file = create_test_csv("Name\tAddress\nAcme\t1 Main St\n");

        let source = CsvSource::with_options(file.path(), CsvOptions::tsv()).unwrap();
        let data = source.read_all().unwrap();

        assert_eq!(data[1], vec!["Acme", "1 Main St"]);
    }

    #[test]
    fn test_csv_quoted_fields() {
        let csv_content = r#"Name,Address
"Acme","1 Main St, Suite ""B"""
"#;
        let file = create_test_csv(csv_content);

        let source = CsvSource::new(file.path()).unwrap();
        let data = source.read_all().unwrap();

        assert_eq!(data[1][1], r#"1 Main St, Suite "B""#);
    }

    #[test]
    fn test_csv_single_sheet() {
        let file = create_test_csv("A,B\n1,2\n");

        let source = CsvSource::new(file.path()).unwrap();
        assert_eq!(source.list_sheets().unwrap(), vec![CSV_SHEET_NAME.to_string()]);
        assert_eq!(source.default_sheet(), Some(CSV_SHEET_NAME.to_string()));
    }

    #[test]
    fn test_csv_file_not_found() {
        let result = CsvSource::new("/nonexistent/path/file.csv");
        assert!(result.is_err());
    }
}
