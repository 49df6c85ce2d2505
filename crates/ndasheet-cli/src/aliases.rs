//! Field alias resolution.
//!
//! Form clients send either the spreadsheet header (`"Company Name A"`) or a
//! camel-case key (`"companyNameA"`). The store only accepts canonical names,
//! so incoming payloads go through an [`AliasTable`] first.

use serde_json::{Map, Value};
use tracing::debug;

use ndasheet_store::{CellValue, FieldRole, Record, TableSchema};

/// Alternate spellings of one canonical field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAlias {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

/// Aliases accepted for the NDA party form
pub const NDA_ALIASES: &[FieldAlias] = &[
    FieldAlias {
        canonical: "User Email",
        aliases: &["userEmail"],
    },
    FieldAlias {
        canonical: "Date",
        aliases: &["date"],
    },
    FieldAlias {
        canonical: "Company Name A",
        aliases: &["companyNameA"],
    },
    FieldAlias {
        canonical: "LLPIN",
        aliases: &["llpin"],
    },
    FieldAlias {
        canonical: "Address A",
        aliases: &["addressA"],
    },
    FieldAlias {
        canonical: "CA FIRM NAME",
        aliases: &["caFirmName"],
    },
    FieldAlias {
        canonical: "CA NAME",
        aliases: &["caName"],
    },
    FieldAlias {
        canonical: "MEMBER REG NO",
        aliases: &["memberRegNo"],
    },
    FieldAlias {
        canonical: "PARTNER/PROPRIETOR",
        aliases: &["partnerProprietor"],
    },
    FieldAlias {
        canonical: "Company Name B",
        aliases: &["companyNameB"],
    },
    FieldAlias {
        canonical: "CIN",
        aliases: &["cin"],
    },
    FieldAlias {
        canonical: "Address B",
        aliases: &["addressB"],
    },
];

/// Maps payload keys onto a schema's canonical field names
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    schema: &'static TableSchema,
    entries: &'static [FieldAlias],
}

impl AliasTable {
    pub const fn new(schema: &'static TableSchema, entries: &'static [FieldAlias]) -> Self {
        Self { schema, entries }
    }

    /// Build a record from a JSON object.
    ///
    /// For each field the canonical key is tried first, then its aliases; the
    /// first non-empty value wins. When no identity value is present,
    /// `identity` (the authenticated user) fills it in.
    pub fn resolve(&self, body: &Map<String, Value>, identity: Option<&str>) -> Record {
        let mut record = Record::new();

        for field in self.schema.fields {
            if field.role == FieldRole::Generated {
                continue;
            }
            let aliases = self
                .entries
                .iter()
                .find(|e| e.canonical == field.name)
                .map(|e| e.aliases)
                .unwrap_or(&[]);

            let value = std::iter::once(field.name)
                .chain(aliases.iter().copied())
                .filter_map(|key| body.get(key))
                .find(|v| is_truthy(v));

            if let Some(value) = value {
                record.insert(field.name, json_to_cell(value));
            } else if field.role == FieldRole::Identity {
                if let Some(identity) = identity.filter(|s| !s.trim().is_empty()) {
                    record.insert(field.name, identity);
                }
            }
        }

        for key in body.keys() {
            if !self.is_known(key) {
                debug!(field = %key, "ignoring unknown field");
            }
        }

        record
    }

    fn is_known(&self, key: &str) -> bool {
        self.schema.field(key).is_some()
            || self.entries.iter().any(|e| e.aliases.contains(&key))
    }
}

/// JavaScript-style truthiness, matching how form payloads were read
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => n
            .as_f64()
            .map(CellValue::Number)
            .unwrap_or_else(|| CellValue::Text(n.to_string())),
        Value::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}
