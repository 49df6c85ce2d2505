//! Configuration settings.
//!
//! Settings are loaded from `ndasheet.toml` in the working directory, or
//! from the file given with `--config`:
//!
//! ```toml
//! [store]
//! path = "saved_texts.xlsx"
//! table = "User Details"
//!
//! [options]
//! path = "worked_for.xlsx"
//!
//! [log]
//! level = "info"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ndasheet_store::NDA_PARTIES_V1;

/// File names probed when no `--config` is given
const DEFAULT_CONFIG_FILES: &[&str] = &["ndasheet.toml", ".ndasheet.toml"];

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Primary record store
    pub store: StoreSettings,
    /// Options file for the party A list
    pub options: OptionsSettings,
    /// Logging
    pub log: LogSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from a config file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Self::read_file(path)
            }
            None => {
                for candidate in DEFAULT_CONFIG_FILES {
                    let path = Path::new(candidate);
                    if path.exists() {
                        return Self::read_file(path);
                    }
                }
                Ok(Settings::default())
            }
        }
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Apply command-line overrides on top of file values
    pub fn with_overrides(
        mut self,
        store: Option<PathBuf>,
        table: Option<String>,
        options: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = store {
            self.store.path = path;
        }
        if let Some(table) = table {
            self.store.table = table;
        }
        if let Some(path) = options {
            self.options.path = path;
        }
        self
    }
}

/// Record store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Workbook holding the records
    pub path: PathBuf,
    /// Sheet name inside the workbook
    pub table: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("saved_texts.xlsx"),
            table: NDA_PARTIES_V1.default_table.to_string(),
        }
    }
}

/// Options file configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsSettings {
    /// Workbook or CSV listing party A options
    pub path: PathBuf,
}

impl Default for OptionsSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("worked_for.xlsx"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
