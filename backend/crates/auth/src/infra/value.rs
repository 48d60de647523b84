//! SurrealQL values
//!
//! Typed values produced by the input transforms. `Display` renders a
//! SurrealQL literal, `into_json` the JSON the adapters hand back.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

use crate::domain::adapter::AdapterError;

/// Typed record reference (`table:key`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub table: String,
    pub key: String,
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl RecordId {
    pub fn new(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Parse a string, using `default_table` when it carries no table prefix
    pub fn parse_or(s: &str, default_table: &str) -> Result<Self, AdapterError> {
        match s.parse::<RecordId>() {
            Ok(id) => Ok(id),
            Err(_) if !s.is_empty() => Ok(Self::new(default_table, s)),
            Err(e) => Err(e),
        }
    }
}

impl FromStr for RecordId {
    type Err = AdapterError;

    /// Accepts `table:key`, `table:⟨key⟩` and ``table:`key` ``
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AdapterError::InvalidRecordId(s.to_string());

        let (table, raw_key) = s.split_once(':').ok_or_else(invalid)?;
        if !is_ident(table) {
            return Err(invalid());
        }

        let key = if let Some(inner) = raw_key
            .strip_prefix('⟨')
            .and_then(|k| k.strip_suffix('⟩'))
        {
            inner.replace("\\⟩", "⟩")
        } else if let Some(inner) = raw_key
            .strip_prefix('`')
            .and_then(|k| k.strip_suffix('`'))
        {
            inner.replace("\\`", "`")
        } else {
            raw_key.to_string()
        };

        if key.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(table, key))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = is_ident(&self.key) && !self.key.chars().all(|c| c.is_ascii_digit());
        if plain {
            write!(f, "{}:{}", self.table, self.key)
        } else {
            write!(f, "{}:⟨{}⟩", self.table, self.key.replace('⟩', "\\⟩"))
        }
    }
}

/// A value as stored and compared by the adapters
#[derive(Debug, Clone, PartialEq)]
pub enum SurrealValue {
    Null,
    Bool(bool),
    Number(Number),
    Strand(String),
    Datetime(DateTime<Utc>),
    Thing(RecordId),
    Array(Vec<SurrealValue>),
    Object(BTreeMap<String, SurrealValue>),
}

/// Single-quoted string literal
pub fn quote_str(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl SurrealValue {
    /// Untyped conversion; strings stay strings
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => SurrealValue::Null,
            Value::Bool(b) => SurrealValue::Bool(b),
            Value::Number(n) => SurrealValue::Number(n),
            Value::String(s) => SurrealValue::Strand(s),
            Value::Array(items) => {
                SurrealValue::Array(items.into_iter().map(Self::from_json).collect())
            }
            Value::Object(map) => SurrealValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            SurrealValue::Null => Value::Null,
            SurrealValue::Bool(b) => Value::Bool(b),
            SurrealValue::Number(n) => Value::Number(n),
            SurrealValue::Strand(s) => Value::String(s),
            SurrealValue::Datetime(dt) => Value::String(format_datetime(&dt)),
            SurrealValue::Thing(id) => Value::String(id.to_string()),
            SurrealValue::Array(items) => {
                Value::Array(items.into_iter().map(Self::into_json).collect())
            }
            SurrealValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SurrealValue::Strand(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SurrealValue::Null)
    }

    /// Text used by the string functions of where clauses
    pub fn to_text(&self) -> String {
        match self {
            SurrealValue::Strand(s) => s.clone(),
            SurrealValue::Datetime(dt) => format_datetime(dt),
            SurrealValue::Thing(id) => id.to_string(),
            SurrealValue::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for SurrealValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurrealValue::Null => f.write_str("NULL"),
            SurrealValue::Bool(b) => write!(f, "{b}"),
            SurrealValue::Number(n) => write!(f, "{n}"),
            SurrealValue::Strand(s) => f.write_str(&quote_str(s)),
            SurrealValue::Datetime(dt) => write!(f, "<datetime>{}", quote_str(&format_datetime(dt))),
            SurrealValue::Thing(id) => write!(f, "{id}"),
            SurrealValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            SurrealValue::Object(map) => {
                if map.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let key = serde_json::to_string(key).map_err(|_| fmt::Error)?;
                    write!(f, "{key}: {value}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_record_id_parse() {
        let id: RecordId = "user:abc123".parse().unwrap();
        assert_eq!(id, RecordId::new("user", "abc123"));

        let id: RecordId = "user:⟨a-b⟩".parse().unwrap();
        assert_eq!(id.key, "a-b");

        let id: RecordId = "user:`x y`".parse().unwrap();
        assert_eq!(id.key, "x y");

        assert!("abc".parse::<RecordId>().is_err());
        assert!("user:".parse::<RecordId>().is_err());
        assert!("2024-01-01T10:00".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_record_id_parse_or() {
        let id = RecordId::parse_or("abc", "session").unwrap();
        assert_eq!(id.to_string(), "session:abc");

        let id = RecordId::parse_or("user:abc", "session").unwrap();
        assert_eq!(id.table, "user");

        assert!(RecordId::parse_or("", "user").is_err());
    }

    #[test]
    fn test_record_id_display_escapes() {
        assert_eq!(RecordId::new("user", "abc").to_string(), "user:abc");
        assert_eq!(RecordId::new("user", "123").to_string(), "user:⟨123⟩");
        assert_eq!(RecordId::new("user", "a-b").to_string(), "user:⟨a-b⟩");

        let round: RecordId = RecordId::new("user", "a⟩b").to_string().parse().unwrap();
        assert_eq!(round.key, "a⟩b");
    }

    #[test]
    fn test_literal_rendering() {
        assert_eq!(SurrealValue::Strand("it's".into()).to_string(), r"'it\'s'");
        assert_eq!(SurrealValue::Null.to_string(), "NULL");
        assert_eq!(SurrealValue::Bool(false).to_string(), "false");

        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            SurrealValue::Datetime(dt).to_string(),
            "<datetime>'2024-05-01T12:00:00Z'"
        );

        let arr = SurrealValue::from_json(json!(["a", 1]));
        assert_eq!(arr.to_string(), "['a', 1]");

        let obj = SurrealValue::from_json(json!({ "b": true, "a": "x" }));
        assert_eq!(obj.to_string(), r#"{ "a": 'x', "b": true }"#);
    }

    #[test]
    fn test_into_json() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let value = SurrealValue::Array(vec![
            SurrealValue::Thing(RecordId::new("user", "a")),
            SurrealValue::Datetime(dt),
        ]);
        assert_eq!(value.into_json(), json!(["user:a", "2024-05-01T12:00:00Z"]));
    }
}
