//! Table schemas: the canonical column order shared by the header row and
//! every appended row.

use std::collections::HashSet;

use crate::error::{Result, StoreError};

/// How a field gets its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Filled in by the store at append time
    Generated,
    /// Who submitted the record; does not count as content
    Identity,
    /// Caller-supplied data
    Content,
}

/// One column of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub role: FieldRole,
}

impl FieldDef {
    pub const fn generated(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Generated,
        }
    }

    pub const fn identity(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Identity,
        }
    }

    pub const fn content(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Content,
        }
    }
}

/// A named, versioned column layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    /// Sheet name used when none is configured
    pub default_table: &'static str,
    pub version: u32,
    /// Field holding the append timestamp; must be the first column
    pub timestamp_field: &'static str,
    /// Field put through date normalization
    pub date_field: &'static str,
    pub fields: &'static [FieldDef],
}

/// NDA party details, first layout
pub const NDA_PARTIES_V1: TableSchema = TableSchema {
    default_table: "User Details",
    version: 1,
    timestamp_field: "Timestamp",
    date_field: "Date",
    fields: &[
        FieldDef::generated("Timestamp"),
        FieldDef::identity("User Email"),
        FieldDef::content("Date"),
        FieldDef::content("Company Name A"),
        FieldDef::content("LLPIN"),
        FieldDef::content("Address A"),
        FieldDef::content("CA FIRM NAME"),
        FieldDef::content("CA NAME"),
        FieldDef::content("MEMBER REG NO"),
        FieldDef::content("PARTNER/PROPRIETOR"),
        FieldDef::content("Company Name B"),
        FieldDef::content("CIN"),
        FieldDef::content("Address B"),
    ],
};

impl TableSchema {
    /// Header cells in canonical order
    pub fn headers(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column index of a field
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields whose presence makes a record worth saving
    pub fn content_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.role == FieldRole::Content)
    }

    /// Check that the layout is usable by a store
    pub fn validate(&self) -> Result<()> {
        if self.default_table.trim().is_empty() {
            return Err(StoreError::Schema("empty table name".to_string()));
        }

        let mut seen = HashSet::new();
        for field in self.fields {
            if field.name.trim().is_empty() {
                return Err(StoreError::Schema(format!(
                    "empty field name in schema v{}",
                    self.version
                )));
            }
            if !seen.insert(field.name) {
                return Err(StoreError::Schema(format!(
                    "duplicate field '{}'",
                    field.name
                )));
            }
        }

        match self.fields.first() {
            Some(first)
                if first.name == self.timestamp_field && first.role == FieldRole::Generated => {}
            _ => {
                return Err(StoreError::Schema(format!(
                    "'{}' must be the first, generated field",
                    self.timestamp_field
                )))
            }
        }

        let generated = self
            .fields
            .iter()
            .filter(|f| f.role == FieldRole::Generated)
            .count();
        if generated != 1 {
            return Err(StoreError::Schema(format!(
                "expected exactly one generated field, found {}",
                generated
            )));
        }

        if self.position(self.date_field).is_none() {
            return Err(StoreError::Schema(format!(
                "date field '{}' is not a column",
                self.date_field
            )));
        }

        if self.content_fields().next().is_none() {
            return Err(StoreError::Schema("no content fields".to_string()));
        }

        Ok(())
    }
}
