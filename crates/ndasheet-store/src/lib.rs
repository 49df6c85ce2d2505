//! # ndasheet-store
//!
//! Spreadsheet-backed storage for NDA party details: an append-only
//! [`RecordStore`] over one sheet of an `.xlsx` file, and an
//! [`OptionsReader`] over an externally maintained options file.
//!
//! ## Features
//!
//! - **Canonical schema**: header creation and row construction share one
//!   [`TableSchema`] ([`NDA_PARTIES_V1`])
//! - **Date normalization**: `D/M/Y`, `D-M-Y` and ISO timestamps become
//!   calendar dates shown as `dd-mm-yyyy`
//! - **Whole-file rewrites**: every append reloads the workbook with
//!   `calamine` and writes it back with `rust_xlsxwriter`, serialized per file
//! - **CSV options**: the options file may be `.xlsx` or `.csv`
//!
//! ## Example
//!
//! ```rust,no_run
//! use ndasheet_store::{LastEntry, Record, RecordStore};
//!
//! let store = RecordStore::open("saved_texts.xlsx")?;
//! store.append(
//!     &Record::new()
//!         .with("Date", "25/12/2023")
//!         .with("Company Name A", "Acme LLP"),
//! )?;
//!
//! if let LastEntry::Row { row, .. } = store.read_last()? {
//!     println!("{:?}", row.get("Company Name A"));
//! }
//! # Ok::<(), ndasheet_store::StoreError>(())
//! ```

pub mod date;
pub mod error;
pub mod lock;
pub mod options;
pub mod schema;
pub mod sources;
pub mod store;
pub mod value;
pub mod workbook;

// Re-exports
pub use date::{normalize_date, parse_date};
pub use error::{Result, StoreError};
pub use options::OptionsReader;
pub use schema::{FieldDef, FieldRole, TableSchema, NDA_PARTIES_V1};
pub use sources::{CsvOptions, CsvSource, DataSource, ExcelSource};
pub use store::{LastEntry, RecordStore, TableContents, TablePresence};
pub use value::{CellValue, OptionRecord, Record, DATE_DISPLAY_FORMAT};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
