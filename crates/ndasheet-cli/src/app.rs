//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ndasheet_store::{
    LastEntry, OptionRecord, OptionsReader, RecordStore, TableContents, TablePresence,
    NDA_PARTIES_V1,
};

use crate::aliases::{AliasTable, NDA_ALIASES};
use crate::config::Settings;

/// Alias table for the NDA party form
const NDA_FORM: AliasTable = AliasTable::new(&NDA_PARTIES_V1, NDA_ALIASES);

/// Output format for read commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Parser)]
#[command(name = "ndasheet")]
#[command(author, version, about = "Record NDA party details in a spreadsheet", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Record workbook (overrides [store].path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Sheet holding the records (overrides [store].table)
    #[arg(long, global = true)]
    table: Option<String>,

    /// Party A options file (overrides [options].path)
    #[arg(long = "options-file", global = true)]
    options_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append one record to the store
    Append {
        /// Record as a JSON object
        #[arg(long, conflicts_with = "json_file")]
        json: Option<String>,

        /// File containing the record as a JSON object
        #[arg(long)]
        json_file: Option<PathBuf>,

        /// Single field as KEY=VALUE (repeatable)
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Signed-in user, used when the record has no User Email
        #[arg(long)]
        user_email: Option<String>,
    },

    /// Print every row of the store
    ReadAll {
        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the most recent row of the store
    ReadLast {
        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the party A options
    Options {
        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn parse_field(arg: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", arg))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in '{}'", arg));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Where an appended record comes from
#[derive(Debug, Clone, Default)]
pub struct RecordInput {
    pub json: Option<String>,
    pub json_file: Option<PathBuf>,
    pub fields: Vec<(String, String)>,
    pub user_email: Option<String>,
}

impl RecordInput {
    /// Merge JSON and `--field` values into one object; fields win
    fn to_object(&self) -> Result<Map<String, Value>> {
        let json = match (&self.json, &self.json_file) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(path)) => Some(
                fs::read_to_string(path)
                    .with_context(|| format!("Failed to read record file: {}", path.display()))?,
            ),
            (None, None) => None,
        };

        let mut object = match json {
            Some(text) => match serde_json::from_str::<Value>(&text)
                .context("Failed to parse record JSON")?
            {
                Value::Object(map) => map,
                other => anyhow::bail!("Record JSON must be an object, got {}", other),
            },
            None => Map::new(),
        };

        for (key, value) in &self.fields {
            object.insert(key.clone(), Value::String(value.clone()));
        }
        Ok(object)
    }
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?.with_overrides(
        cli.store,
        cli.table,
        cli.options_file,
    );
    init_tracing(&settings.log.level);
    debug!(?settings, "loaded settings");

    let output = match cli.command {
        Commands::Append {
            json,
            json_file,
            fields,
            user_email,
        } => append_command(
            &settings,
            &RecordInput {
                json,
                json_file,
                fields,
                user_email,
            },
        )?,
        Commands::ReadAll { format } => read_all_command(&settings, format)?,
        Commands::ReadLast { format } => read_last_command(&settings, format)?,
        Commands::Options { format } => options_command(&settings, format)?,
    };

    println!("{}", output);
    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` overrides `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_store(settings: &Settings) -> Result<RecordStore> {
    RecordStore::with_schema(&settings.store.path, &settings.store.table, &NDA_PARTIES_V1)
        .context("Failed to open record store")
}

/// Execute the append command
pub fn append_command(settings: &Settings, input: &RecordInput) -> Result<String> {
    let body = input.to_object()?;
    let record = NDA_FORM.resolve(&body, input.user_email.as_deref());

    let store = open_store(settings)?;
    store.append(&record).with_context(|| {
        format!(
            "Failed to save details to {}",
            settings.store.path.display()
        )
    })?;

    Ok(format!(
        "Details saved to {} ({}).",
        settings.store.path.display(),
        settings.store.table
    ))
}

/// Execute the read-all command
pub fn read_all_command(settings: &Settings, format: OutputFormat) -> Result<String> {
    let contents = open_store(settings)?
        .read_all()
        .with_context(|| format!("Failed to read {}", settings.store.path.display()))?;

    match format {
        OutputFormat::Json => to_json(&contents),
        OutputFormat::Text => Ok(render_table(&contents, settings)),
    }
}

/// Execute the read-last command
pub fn read_last_command(settings: &Settings, format: OutputFormat) -> Result<String> {
    let entry = open_store(settings)?
        .read_last()
        .with_context(|| format!("Failed to read {}", settings.store.path.display()))?;

    match format {
        OutputFormat::Json => to_json(&entry),
        OutputFormat::Text => Ok(render_last(&entry, settings)),
    }
}

/// Execute the options command
pub fn options_command(settings: &Settings, format: OutputFormat) -> Result<String> {
    let options = OptionsReader::new(&settings.options.path)
        .read_all()
        .with_context(|| format!("Failed to read options from {}", settings.options.path.display()))?;

    match format {
        OutputFormat::Json => to_json(&options),
        OutputFormat::Text => Ok(render_options(&options, &settings.options.path)),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

fn absence_message(presence: TablePresence, settings: &Settings) -> String {
    match presence {
        TablePresence::FileMissing => format!(
            "No Excel file found yet at {}.",
            settings.store.path.display()
        ),
        TablePresence::TableMissing => format!(
            "No sheet named '{}' in {}.",
            settings.store.table,
            settings.store.path.display()
        ),
        TablePresence::Empty => format!(
            "No data found in sheet '{}' of {}.",
            settings.store.table,
            settings.store.path.display()
        ),
        TablePresence::Present => String::new(),
    }
}

fn render_table(contents: &TableContents, settings: &Settings) -> String {
    if contents.presence != TablePresence::Present {
        return absence_message(contents.presence, settings);
    }

    let mut output = String::new();
    output.push_str(&contents.headers.join(" | "));
    if contents.rows.is_empty() {
        output.push_str("\n(no rows)");
        return output;
    }
    for row in &contents.rows {
        output.push('\n');
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        output.push_str(&cells.join(" | "));
    }
    output
}

fn render_last(entry: &LastEntry, settings: &Settings) -> String {
    match entry {
        LastEntry::NotFound { presence } => absence_message(*presence, settings),
        LastEntry::HeadersOnly { headers } => format!(
            "Only headers found in Excel file: {}",
            headers.join(" | ")
        ),
        LastEntry::Row { row, .. } => row
            .iter()
            .map(|(header, value)| format!("{}: {}", header, value))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn render_options(options: &[OptionRecord], path: &Path) -> String {
    if options.is_empty() {
        return format!("No options found in {}.", path.display());
    }
    options
        .iter()
        .map(|option| {
            option
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_append_fields() {
        let args = vec![
            "ndasheet",
            "append",
            "--field",
            "cin=U123",
            "--field",
            "Company Name A=Acme LLP",
            "--user-email",
            "me@example.com",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Append {
                json,
                fields,
                user_email,
                ..
            } => {
                assert!(json.is_none());
                assert_eq!(
                    fields,
                    vec![
                        ("cin".to_string(), "U123".to_string()),
                        ("Company Name A".to_string(), "Acme LLP".to_string()),
                    ]
                );
                assert_eq!(user_email.as_deref(), Some("me@example.com"));
            }
            _ => panic!("Expected Append command"),
        }
    }

    #[test]
    fn test_cli_parse_bad_field() {
        let args = vec!["ndasheet", "append", "--field", "no-equals-sign"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_json_conflicts_with_json_file() {
        let args = vec![
            "ndasheet",
            "append",
            "--json",
            "{}",
            "--json-file",
            "record.json",
        ];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_parse_read_all_default_format() {
        let cli = Cli::try_parse_from(vec!["ndasheet", "read-all"]).unwrap();
        match cli.command {
            Commands::ReadAll { format } => assert_eq!(format, OutputFormat::Text),
            _ => panic!("Expected ReadAll command"),
        }
    }

    #[test]
    fn test_cli_parse_global_overrides() {
        let args = vec![
            "ndasheet",
            "read-last",
            "--format",
            "json",
            "--store",
            "other.xlsx",
            "--table",
            "Parties",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.store, Some(PathBuf::from("other.xlsx")));
        assert_eq!(cli.table.as_deref(), Some("Parties"));
        match cli.command {
            Commands::ReadLast { format } => assert_eq!(format, OutputFormat::Json),
            _ => panic!("Expected ReadLast command"),
        }
    }

    #[test]
    fn test_cli_parse_options() {
        let args = vec!["ndasheet", "--options-file", "clients.csv", "options"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.options_file, Some(PathBuf::from("clients.csv")));
        assert!(matches!(cli.command, Commands::Options { .. }));
    }

    #[test]
    fn test_record_input_fields_override_json() {
        let input = RecordInput {
            json: Some(r#"{"cin": "from-json", "llpin": "L1"}"#.to_string()),
            fields: vec![("cin".to_string(), "from-field".to_string())],
            ..Default::default()
        };
        let object = input.to_object().unwrap();

        assert_eq!(object["cin"], Value::String("from-field".to_string()));
        assert_eq!(object["llpin"], Value::String("L1".to_string()));
    }

    #[test]
    fn test_record_input_rejects_non_object() {
        let input = RecordInput {
            json: Some("[1, 2]".to_string()),
            ..Default::default()
        };
        assert!(input.to_object().is_err());
    }
}
