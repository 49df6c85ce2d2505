//! Cell values and field records.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Display format applied to normalized date cells
pub const DATE_DISPLAY_FORMAT: &str = "dd-mm-yyyy";

/// Display format for date cells that were never annotated
pub const DEFAULT_DATE_FORMAT: &str = "yyyy-mm-dd";

/// Display format for cells carrying a time of day
pub const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// A scalar cell value
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Blank cell, serialized as `null`
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Calendar date without time of day
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// True for blank cells and text that is only whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert an Excel serial day number (1900 system) to a date value.
    ///
    /// Whole numbers become [`CellValue::Date`]; fractional ones keep their
    /// time of day.
    pub fn from_excel_serial(serial: f64) -> Option<Self> {
        let epoch = excel_epoch()?;
        let days = serial.floor();
        let secs = ((serial - days) * 86_400.0).round() as i64;
        let date = epoch.checked_add_signed(Duration::try_days(days as i64)?)?;
        if secs == 0 {
            return Some(CellValue::Date(date));
        }
        let datetime = date.and_hms_opt(0, 0, 0)? + Duration::try_seconds(secs)?;
        Some(CellValue::DateTime(datetime))
    }

    /// Excel serial day number for date values
    pub fn excel_serial(&self) -> Option<f64> {
        let epoch = excel_epoch()?;
        match self {
            CellValue::Date(date) => Some((*date - epoch).num_days() as f64),
            CellValue::DateTime(dt) => {
                let days = (dt.date() - epoch).num_days() as f64;
                let secs = dt.time().num_seconds_from_midnight() as f64;
                Some(days + secs / 86_400.0)
            }
            _ => None,
        }
    }
}

/// Day zero of the 1900 date system, adjusted for the 1900 leap-year bug
fn excel_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Text(s) => f.write_str(s),
            CellValue::Date(d) => write!(f, "{}", d.format("%d-%m-%Y")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

/// An ordered mapping from field name to value.
///
/// Keys keep their first insertion position; inserting an existing key
/// replaces its value in place. Serializes as a JSON object in key order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

/// One row of the options file, keyed by its inferred headers
pub type OptionRecord = Record;

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<CellValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blank() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::from("").is_blank());
        assert!(CellValue::from("   ").is_blank());
        assert!(!CellValue::from("x").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::Number(10.0).to_string(), "10");
        assert_eq!(CellValue::Number(3.5).to_string(), "3.5");
        let date = NaiveDate::from_ymd_opt(2023, 12, 25).unwrap();
        assert_eq!(CellValue::Date(date).to_string(), "25-12-2023");
    }

    #[test]
    fn test_excel_serial() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 25).unwrap();
        let serial = CellValue::Date(date).excel_serial().unwrap();
        assert_eq!(serial, 45285.0);
        assert_eq!(
            CellValue::from_excel_serial(serial),
            Some(CellValue::Date(date))
        );
    }

    #[test]
    fn test_excel_serial_with_time() {
        let value = CellValue::from_excel_serial(45285.5).unwrap();
        let expected = NaiveDate::from_ymd_opt(2023, 12, 25)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(value, CellValue::DateTime(expected));
    }

    #[test]
    fn test_record_keeps_insertion_order() {
        let mut record = Record::new().with("b", "1").with("a", "2");
        record.insert("b", "3");

        let keys: Vec<_> = record.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(record.get("b"), Some(&CellValue::from("3")));
    }

    #[test]
    fn test_record_serializes_as_object() {
        let record = Record::new()
            .with("Name", "Acme")
            .with("Count", 2.0)
            .with("Note", CellValue::Empty);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"Name":"Acme","Count":2.0,"Note":null}"#);
    }
}
