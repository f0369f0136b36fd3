// Records - one row of an input table with typed cells
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Text(String),
}

impl CellValue {
    /// Coerce a raw CSV field into the narrowest matching type
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return CellValue::Float(f);
            }
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return CellValue::Date(dt);
            }
        }
        for format in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
                if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                    return CellValue::Date(dt);
                }
            }
        }
        CellValue::Text(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            CellValue::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            CellValue::Date(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            CellValue::Text(s) => write!(f, "{}", s),
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

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// One row of a table, columns kept in file order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    cells: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.insert(column, value.into());
        self
    }

    /// Set a cell, replacing an existing value in place
    pub fn insert(&mut self, column: &str, value: CellValue) {
        match self.cells.iter_mut().find(|(name, _)| name == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column.to_string(), value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Cell rendered as text; absent and empty cells give ""
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cells() {
        assert_eq!(CellValue::parse(""), CellValue::Empty);
        assert_eq!(CellValue::parse("   "), CellValue::Empty);
        assert_eq!(CellValue::parse("42"), CellValue::Integer(42));
        assert_eq!(CellValue::parse("4.5"), CellValue::Float(4.5));
        assert_eq!(CellValue::parse("TRUE"), CellValue::Bool(true));
        assert_eq!(CellValue::parse("False"), CellValue::Bool(false));
        assert_eq!(
            CellValue::parse("casino night"),
            CellValue::Text("casino night".to_string())
        );
    }

    #[test]
    fn test_parse_dates() {
        let value = CellValue::parse("2024-03-01");
        assert!(matches!(value, CellValue::Date(_)));
        assert_eq!(value.to_string(), "2024-03-01");

        let value = CellValue::parse("2024-03-01 10:15:00");
        assert_eq!(value.to_string(), "2024-03-01 10:15:00");
    }

    #[test]
    fn test_nan_stays_text() {
        assert_eq!(CellValue::parse("NaN"), CellValue::Text("NaN".to_string()));
    }

    #[test]
    fn test_display_never_fails() {
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::Integer(7).to_string(), "7");
        assert_eq!(CellValue::Float(0.5).to_string(), "0.5");
        assert_eq!(CellValue::Bool(true).to_string(), "True");
    }

    #[test]
    fn test_record_insert_replaces_in_place() {
        let mut record = Record::new().with("Anchor", "a").with("Source url", "b");
        record.insert("Anchor", CellValue::from("c"));
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["Anchor", "Source url"]);
        assert_eq!(record.text("Anchor"), "c");
        assert_eq!(record.text("Missing"), "");
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(CellValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(CellValue::from("12").as_f64(), Some(12.0));
        assert_eq!(CellValue::Empty.as_f64(), None);
        assert_eq!(CellValue::Bool(true).as_bool(), Some(true));
    }
}
