// Record values exchanged through the storage contract.
//
// The auth layer distinguishes timestamps from plain text, the remote store
// only ever sees JSON. `Value` keeps timestamps typed until they are
// serialised, at which point they become ISO-8601 strings.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A single row: field name to value.
pub type Record = BTreeMap<String, Value>;

/// A field value inside a [`Record`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// A point in time. Only produced by callers or by date detection on
    /// the way back from the remote store, never by plain deserialisation.
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    Object(Record),
}

/// Canonical text form of a timestamp: `2025-01-01T00:00:00.000Z`.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Record> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Consume the value, returning the inner record if it is an object.
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when the value is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Text form used for identifiers and regex patterns.
    ///
    /// Strings are returned as-is, dates in canonical form, everything else
    /// (null included) as its JSON rendering.
    pub fn to_text(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Date(d) => format_timestamp(d),
            other => serde_json::Value::from(other.clone()).to_string(),
        }
    }
}

/// Build a [`Record`] from a JSON object literal. Non-objects yield an empty record.
pub fn record_from_json(json: serde_json::Value) -> Record {
    Value::from(json).into_record().unwrap_or_default()
}

// ─── Conversions ─────────────────────────────────────────────────

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Value::Number(n),
            Value::String(s) => serde_json::Value::String(s),
            Value::Date(d) => serde_json::Value::String(format_timestamp(&d)),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Record> for Value {
    fn from(map: Record) -> Self {
        Self::Object(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_serialises_as_iso_string() {
        let d = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let json = serde_json::to_value(Value::Date(d)).unwrap();
        assert_eq!(json, serde_json::json!("2025-01-02T03:04:05.000Z"));
    }

    #[test]
    fn test_deserialise_keeps_strings_as_strings() {
        let v: Value = serde_json::from_str(r#""2025-01-02T03:04:05.000Z""#).unwrap();
        assert_eq!(v, Value::String("2025-01-02T03:04:05.000Z".into()));
    }

    #[test]
    fn test_record_from_json() {
        let rec = record_from_json(serde_json::json!({"name": "Alice", "tags": ["a", 1]}));
        assert_eq!(rec["name"], Value::from("Alice"));
        assert_eq!(rec["tags"], Value::Array(vec![Value::from("a"), Value::from(1)]));

        assert!(record_from_json(serde_json::json!("not an object")).is_empty());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::from("abc").to_text(), "abc");
        assert_eq!(Value::from(42).to_text(), "42");
        assert_eq!(Value::Null.to_text(), "null");
        assert_eq!(Value::from(true).to_text(), "true");
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        assert!(Value::from(f64::NAN).is_null());
        assert_eq!(Value::from(1.5).as_f64(), Some(1.5));
    }
}
