// Remote record API contract.
//
// The remote store speaks a record-oriented REST API: create, list with a
// filter, edit by id, delete by id. Filters use a small grammar: a list of
// conjuncts, each either a single-field predicate or an `or` group. The only
// native predicates are equality, `ne`, `lte`, `gte` and `regex`.

use std::fmt;

use async_trait::async_trait;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::db::value::{Record, Value};
use crate::error::RemoteResult;

// ─── Filter Grammar ──────────────────────────────────────────────

/// A single-field predicate in the remote vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `{field: value}`
    Equals(Value),
    /// `{field: {ne: value}}`
    NotEquals(Value),
    /// `{field: {lte: value}}`
    Lte(Value),
    /// `{field: {gte: value}}`
    Gte(Value),
    /// `{field: {regex: pattern, options: options}}`
    Regex { pattern: String, options: String },
}

/// One node of a remote filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Field { field: String, predicate: Predicate },
    Or(Vec<FilterNode>),
}

impl FilterNode {
    pub fn field(field: impl Into<String>, predicate: Predicate) -> Self {
        Self::Field {
            field: field.into(),
            predicate,
        }
    }
}

/// A conjunction of [`FilterNode`]s. Empty means "match everything".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteFilter {
    pub conditions: Vec<FilterNode>,
}

impl RemoteFilter {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// JSON rendering, `{}` when empty, `{"filter": [...]}` otherwise.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Equals(v) => v.serialize(serializer),
            Self::NotEquals(v) => single_entry(serializer, "ne", v),
            Self::Lte(v) => single_entry(serializer, "lte", v),
            Self::Gte(v) => single_entry(serializer, "gte", v),
            Self::Regex { pattern, options } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("regex", pattern)?;
                map.serialize_entry("options", options)?;
                map.end()
            }
        }
    }
}

fn single_entry<S: Serializer, V: Serialize>(
    serializer: S,
    key: &str,
    value: &V,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, value)?;
    map.end()
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Field { field, predicate } => single_entry(serializer, field, predicate),
            Self::Or(nodes) => single_entry(serializer, "or", nodes),
        }
    }
}

impl Serialize for RemoteFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = usize::from(!self.conditions.is_empty());
        let mut map = serializer.serialize_map(Some(len))?;
        if !self.conditions.is_empty() {
            map.serialize_entry("filter", &self.conditions)?;
        }
        map.end()
    }
}

// ─── Record Query ────────────────────────────────────────────────

/// Page request. Pages are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub page: u32,
}

/// Remote sort spec, serialised as `{field: 1}` or `{field: -1}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSort {
    pub field: String,
    pub ascending: bool,
}

impl RemoteSort {
    pub fn direction(&self) -> i8 {
        if self.ascending {
            1
        } else {
            -1
        }
    }
}

impl Serialize for RemoteSort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        single_entry(serializer, &self.field, &self.direction())
    }
}

/// Body of a `get_records` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordQuery {
    #[serde(flatten)]
    pub filter: RemoteFilter,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<RemoteSort>,
}

impl RecordQuery {
    pub fn new(filter: RemoteFilter, limit: u32, page: u32) -> Self {
        Self {
            filter,
            pagination: Pagination { limit, page },
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: RemoteSort) -> Self {
        self.sort = Some(sort);
        self
    }
}

// ─── Responses ───────────────────────────────────────────────────

/// `{data: record}` envelope of create/edit calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResponse {
    #[serde(default)]
    pub data: Option<Record>,
}

/// `{data: [record]}` envelope of list calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsResponse {
    #[serde(default)]
    pub data: Option<Vec<Record>>,
}

impl RecordResponse {
    pub fn unwrap_record(self) -> Option<Record> {
        self.data
    }
}

impl RecordsResponse {
    /// The listed records, empty when the envelope had none.
    pub fn unwrap_records(self) -> Vec<Record> {
        self.data.unwrap_or_default()
    }
}

/// Identity of a remote record, read from its `_id` field.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("_id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ─── Client Trait ────────────────────────────────────────────────

/// The remote record API.
///
/// Implemented by the HTTP client and by the in-memory store. Adapters hold
/// it as `Arc<dyn RemoteRecordApi>` so tests can substitute a fake.
#[async_trait]
pub trait RemoteRecordApi: Send + Sync + fmt::Debug {
    async fn create_record(&self, table: &str, data: Record) -> RemoteResult<RecordResponse>;

    async fn get_records(&self, table: &str, query: &RecordQuery) -> RemoteResult<RecordsResponse>;

    async fn edit_record_by_id(
        &self,
        table: &str,
        id: &str,
        data: Record,
    ) -> RemoteResult<RecordResponse>;

    async fn delete_record_by_id(&self, table: &str, id: &str) -> RemoteResult<()>;
}
