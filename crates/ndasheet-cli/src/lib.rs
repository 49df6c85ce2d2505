//! ndasheet CLI - Command-line interface library
//!
//! This library provides the CLI functionality for ndasheet:
//! - Append: Save one set of NDA party details
//! - ReadAll / ReadLast: Show saved records
//! - Options: List party A options
//!
//! # Library Usage
//!
//! ```ignore
//! use ndasheet_cli::{read_all_command, OutputFormat, Settings};
//!
//! let settings = Settings::load(None)?;
//! println!("{}", read_all_command(&settings, OutputFormat::Json)?);
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Save a record from camel-case form fields
//! ndasheet append --json '{"companyNameA": "Acme LLP", "date": "25/12/2023"}'
//!
//! # Show the last saved record as JSON
//! ndasheet read-last --format json
//!
//! # List party A options from a CSV file
//! ndasheet --options-file clients.csv options
//! ```

pub mod aliases;
pub mod app;
pub mod config;

// Re-export main entry point and types
pub use aliases::{AliasTable, FieldAlias, NDA_ALIASES};
pub use app::{
    append_command, init_tracing, options_command, read_all_command, read_last_command,
};
pub use app::{run_cli, OutputFormat, RecordInput};
pub use config::Settings;
