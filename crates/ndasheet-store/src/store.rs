//! The append-only record store over one named table.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::date::normalize_date;
use crate::error::{Result, StoreError};
use crate::lock::FileLock;
use crate::schema::{FieldRole, TableSchema, NDA_PARTIES_V1};
use crate::value::{CellValue, Record, DATE_DISPLAY_FORMAT};
use crate::workbook::{Cell, Sheet, Workbook};

/// What a read found on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TablePresence {
    /// No file at the store path
    FileMissing,
    /// The file exists but has no sheet with the table's name
    TableMissing,
    /// The sheet exists but has no header row
    Empty,
    Present,
}

/// Every row of a table, positionally
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableContents {
    pub presence: TablePresence,
    pub headers: Vec<String>,
    /// Data rows, each padded with blanks to at least the header width
    pub rows: Vec<Vec<CellValue>>,
}

impl TableContents {
    fn absent(presence: TablePresence) -> Self {
        Self {
            presence,
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// Result of [`RecordStore::read_last`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LastEntry {
    /// No file, no table in it, or a table without a header row
    NotFound { presence: TablePresence },
    /// The table has a header row but no data yet
    HeadersOnly { headers: Vec<String> },
    /// The final data row keyed by header
    Row { headers: Vec<String>, row: Record },
}

impl LastEntry {
    pub fn headers(&self) -> &[String] {
        match self {
            LastEntry::NotFound { .. } => &[],
            LastEntry::HeadersOnly { headers } | LastEntry::Row { headers, .. } => headers,
        }
    }

    pub fn row(&self) -> Option<&Record> {
        match self {
            LastEntry::Row { row, .. } => Some(row),
            _ => None,
        }
    }
}

/// Why the date cell of a new row kept its default format
#[derive(Debug, Error)]
enum AnnotationSkipped {
    #[error("no '{0}' column in the header row")]
    NoDateColumn(String),
    #[error("row {0} has no cell in the date column")]
    NoCell(usize),
    #[error("date cell holds a non-date value")]
    NotADate,
}

/// Append-only store of records in one sheet of an XLSX file
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    table: String,
    schema: &'static TableSchema,
    lock: FileLock,
}

impl RecordStore {
    /// Store of NDA party details in the schema's default table
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_schema(path, NDA_PARTIES_V1.default_table, &NDA_PARTIES_V1)
    }

    /// Store with an explicit table name and schema
    pub fn with_schema(
        path: impl Into<PathBuf>,
        table: impl Into<String>,
        schema: &'static TableSchema,
    ) -> Result<Self> {
        schema.validate()?;

        let table = table.into();
        check_table_name(&table)?;

        let path = path.into();
        let lock = FileLock::for_path(&path);
        Ok(Self {
            path,
            table,
            schema,
            lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    /// Append a record stamped with the current time
    pub fn append(&self, record: &Record) -> Result<()> {
        self.append_at(record, Utc::now())
    }

    /// Append a record stamped with `now`.
    ///
    /// Creates the file and table (with the schema's header) when missing,
    /// then rewrites the whole file.
    pub fn append_at(&self, record: &Record, now: DateTime<Utc>) -> Result<()> {
        self.check_content(record)?;
        let row = self.build_row(record, now);

        let _guard = self.lock.acquire();

        let mut workbook = if self.path.exists() {
            Workbook::load(&self.path)?
        } else {
            debug!(path = %self.path.display(), "creating workbook");
            Workbook::new()
        };

        let schema = self.schema;
        let sheet = workbook.sheet_or_add(&self.table);

        if sheet.row_count() == 0 {
            debug!(table = %self.table, version = schema.version, "writing header row");
            sheet.push_row(
                schema
                    .headers()
                    .into_iter()
                    .map(|h| Cell::new(CellValue::Text(h)))
                    .collect(),
            );
        } else {
            self.check_header(sheet)?;
        }

        sheet.push_row(row);
        let row_number = sheet.row_count();

        if let Err(reason) = annotate_date_cell(sheet, schema.date_field) {
            match reason {
                AnnotationSkipped::NotADate => {
                    debug!(row = row_number, "date kept as text");
                }
                other => {
                    warn!(table = %self.table, row = row_number, "Could not set Date column format: {}", other);
                }
            }
        }

        workbook.save(&self.path)?;
        info!(
            path = %self.path.display(),
            table = %self.table,
            row = row_number,
            "appended record"
        );
        Ok(())
    }

    /// Header and every data row of the table
    pub fn read_all(&self) -> Result<TableContents> {
        let _guard = self.lock.acquire();

        let workbook = match self.load_existing()? {
            Some(workbook) => workbook,
            None => return Ok(TableContents::absent(TablePresence::FileMissing)),
        };
        let Some(sheet) = workbook.sheet(&self.table) else {
            return Ok(TableContents::absent(TablePresence::TableMissing));
        };

        let headers = sheet.headers();
        if headers.is_empty() {
            return Ok(TableContents::absent(TablePresence::Empty));
        }
        let rows = sheet
            .data_rows()
            .iter()
            .map(|row| {
                let width = row.len().max(headers.len());
                (0..width)
                    .map(|i| row.get(i).map(|c| c.value.clone()).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(TableContents {
            presence: TablePresence::Present,
            headers,
            rows,
        })
    }

    /// The final data row, keyed by header
    pub fn read_last(&self) -> Result<LastEntry> {
        let _guard = self.lock.acquire();

        let workbook = match self.load_existing()? {
            Some(workbook) => workbook,
            None => {
                return Ok(LastEntry::NotFound {
                    presence: TablePresence::FileMissing,
                })
            }
        };
        let Some(sheet) = workbook.sheet(&self.table) else {
            return Ok(LastEntry::NotFound {
                presence: TablePresence::TableMissing,
            });
        };

        let headers = sheet.headers();
        if headers.is_empty() {
            return Ok(LastEntry::NotFound {
                presence: TablePresence::Empty,
            });
        }
        let Some(last) = sheet.data_rows().last() else {
            return Ok(LastEntry::HeadersOnly { headers });
        };

        let row = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = last.get(i).map(|c| c.value.clone()).unwrap_or_default();
                (header.clone(), value)
            })
            .collect();

        Ok(LastEntry::Row { headers, row })
    }

    fn load_existing(&self) -> Result<Option<Workbook>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no workbook yet");
            return Ok(None);
        }
        Workbook::load(&self.path).map(Some)
    }

    fn check_content(&self, record: &Record) -> Result<()> {
        let has_content = self
            .schema
            .content_fields()
            .any(|f| record.get(f.name).is_some_and(|v| !v.is_blank()));
        if has_content {
            return Ok(());
        }

        let expected: Vec<_> = self.schema.content_fields().map(|f| f.name).collect();
        Err(StoreError::Validation(format!(
            "expected at least one of {}",
            expected.join(", ")
        )))
    }

    /// The existing header must start with the schema's columns, in order
    fn check_header(&self, sheet: &Sheet) -> Result<()> {
        let expected = self.schema.headers();
        let found = sheet.headers();

        let matches = found.len() >= expected.len()
            && expected
                .iter()
                .zip(&found)
                .all(|(want, have)| want == have.trim());
        if matches {
            return Ok(());
        }

        Err(StoreError::HeaderMismatch {
            table: self.table.clone(),
            expected,
            found,
        })
    }

    fn build_row(&self, record: &Record, now: DateTime<Utc>) -> Vec<Cell> {
        for key in record.keys() {
            if self.schema.field(key).is_none() {
                debug!(field = key, "ignoring field outside the schema");
            }
        }

        self.schema
            .fields
            .iter()
            .map(|field| {
                let value = match field.role {
                    FieldRole::Generated => {
                        CellValue::Text(now.to_rfc3339_opts(SecondsFormat::Millis, true))
                    }
                    _ if field.name == self.schema.date_field => {
                        record.get(field.name).map(normalize_date).unwrap_or_default()
                    }
                    _ => match record.get(field.name) {
                        Some(CellValue::Text(s)) if s.is_empty() => CellValue::Empty,
                        Some(v) => v.clone(),
                        None => CellValue::Empty,
                    },
                };
                Cell::new(value)
            })
            .collect()
    }
}

/// Characters Excel refuses in a worksheet name
const FORBIDDEN_SHEET_CHARS: &[char] = &['/', '\\', '[', ']', ':', '*', '?'];

/// Longest worksheet name Excel accepts
const MAX_SHEET_NAME_CHARS: usize = 31;

/// Reject table names Excel cannot store as a worksheet name
fn check_table_name(table: &str) -> Result<()> {
    let problem = if table.trim().is_empty() {
        Some("empty table name".to_string())
    } else if table.chars().count() > MAX_SHEET_NAME_CHARS {
        Some(format!(
            "table name '{}' is longer than {} characters",
            table, MAX_SHEET_NAME_CHARS
        ))
    } else if let Some(c) = table.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
        Some(format!("table name '{}' contains '{}'", table, c))
    } else if table.starts_with('\'') || table.ends_with('\'') {
        Some(format!(
            "table name '{}' starts or ends with an apostrophe",
            table
        ))
    } else if table.eq_ignore_ascii_case("History") {
        Some("'History' is reserved by Excel".to_string())
    } else {
        None
    };

    match problem {
        Some(msg) => Err(StoreError::Schema(msg)),
        None => Ok(()),
    }
}

/// Give the date cell of the last row the `dd-mm-yyyy` display format
fn annotate_date_cell(sheet: &mut Sheet, date_field: &str) -> std::result::Result<(), AnnotationSkipped> {
    let col = sheet
        .header_column(date_field)
        .ok_or_else(|| AnnotationSkipped::NoDateColumn(date_field.to_string()))?;
    let last = sheet.row_count().saturating_sub(1);
    let cell = sheet
        .cell_mut(last, col)
        .ok_or(AnnotationSkipped::NoCell(last + 1))?;

    match cell.value {
        CellValue::Date(_) => {
            cell.num_format = Some(DATE_DISPLAY_FORMAT.to_string());
            Ok(())
        }
        _ => Err(AnnotationSkipped::NotADate),
    }
}
