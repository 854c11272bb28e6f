// In-memory Totalum record store — HashMap-based `RemoteRecordApi`.
//
// Behaves like the remote service as the adapter sees it: records cross a
// JSON boundary (dates arrive as ISO strings), `_id`/`createdAt`/`updatedAt`
// are assigned by the store, filters use the Totalum grammar, and list
// calls honour pagination and sort. Every call is logged, and failures can
// be injected per table or per record id.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use regex::RegexBuilder;
use tokio::sync::RwLock;

use totalum_auth_core::db::value::{format_timestamp, Record, Value};
use totalum_auth_core::error::{RemoteError, RemoteResult};
use totalum_auth_core::remote::{
    record_id, FilterNode, Predicate, RecordQuery, RecordResponse, RecordsResponse,
    RemoteFilter, RemoteRecordApi, RemoteSort,
};

/// Type alias for the table map.
pub type Tables = HashMap<String, Vec<Record>>;

/// One call received by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Create { table: String },
    Get { table: String },
    Edit { table: String, id: String },
    Delete { table: String, id: String },
}

/// Where an injected failure fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// Every create on this table fails.
    Create { table: String },
    /// Every list call on this table fails.
    Get { table: String },
    /// Every edit of this record id fails.
    Edit { id: String },
    /// Every delete of this record id fails.
    Delete { id: String },
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    calls: Vec<RemoteCall>,
    failures: HashSet<FailurePoint>,
}

/// In-memory Totalum record store.
///
/// Thread-safe via `tokio::sync::RwLock`; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    state: Arc<RwLock<State>>,
}

impl MemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as-is, bypassing id and timestamp assignment.
    pub async fn insert_raw(&self, table: &str, record: Record) {
        self.state
            .write()
            .await
            .tables
            .entry(table.to_string())
            .or_default()
            .push(to_wire(record));
    }

    /// Get a snapshot of all data.
    pub async fn snapshot(&self) -> Tables {
        self.state.read().await.tables.clone()
    }

    /// Records currently in `table`.
    pub async fn records(&self, table: &str) -> Vec<Record> {
        self.state
            .read()
            .await
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of records in `table`.
    pub async fn table_len(&self, table: &str) -> usize {
        self.state
            .read()
            .await
            .tables
            .get(table)
            .map_or(0, Vec::len)
    }

    /// Clear all data, calls and injected failures.
    pub async fn clear(&self) {
        *self.state.write().await = State::default();
    }

    /// Calls received so far, oldest first.
    pub async fn calls(&self) -> Vec<RemoteCall> {
        self.state.read().await.calls.clone()
    }

    pub async fn reset_calls(&self) {
        self.state.write().await.calls.clear();
    }

    /// Make every call matching `point` fail with a 500.
    pub async fn fail_on(&self, point: FailurePoint) {
        self.state.write().await.failures.insert(point);
    }

    pub async fn clear_failures(&self) {
        self.state.write().await.failures.clear();
    }
}

fn injected(point: &FailurePoint) -> RemoteError {
    RemoteError::Status {
        status: 500,
        body: format!("injected failure: {point:?}"),
    }
}

fn not_found(table: &str, id: &str) -> RemoteError {
    RemoteError::Status {
        status: 404,
        body: format!("record '{id}' not found in '{table}'"),
    }
}

/// Round-trip a record through JSON, the way it would travel over HTTP.
fn to_wire(record: Record) -> Record {
    let json = serde_json::Value::from(Value::Object(record));
    Value::from(json).into_record().unwrap_or_default()
}

fn now_text() -> Value {
    Value::String(format_timestamp(&Utc::now()))
}

// ─── Filter Evaluation ───────────────────────────────────────────

/// Check if a record matches a Totalum filter.
pub fn matches_filter(record: &Record, filter: &RemoteFilter) -> bool {
    filter
        .conditions
        .iter()
        .all(|node| matches_node(record, node))
}

fn matches_node(record: &Record, node: &FilterNode) -> bool {
    match node {
        FilterNode::Field { field, predicate } => matches_predicate(record.get(field), predicate),
        FilterNode::Or(nodes) => nodes.iter().any(|n| matches_node(record, n)),
    }
}

fn matches_predicate(field_val: Option<&Value>, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Equals(target) => values_equal(field_val, target),
        Predicate::NotEquals(target) => !values_equal(field_val, target),
        Predicate::Lte(target) => field_val
            .and_then(|v| compare_values(v, target))
            .is_some_and(|o| o != Ordering::Greater),
        Predicate::Gte(target) => field_val
            .and_then(|v| compare_values(v, target))
            .is_some_and(|o| o != Ordering::Less),
        Predicate::Regex { pattern, options } => {
            let Some(text) = field_val.and_then(Value::as_str) else {
                return false;
            };
            RegexBuilder::new(pattern)
                .case_insensitive(options.contains('i'))
                .build()
                .is_ok_and(|re| re.is_match(text))
        }
    }
}

/// Equality as the store sees it. Null also matches a missing field.
fn values_equal(field_val: Option<&Value>, target: &Value) -> bool {
    match (field_val, target) {
        (None, Value::Null) => true,
        (None, _) => false,
        (Some(v), t) => compare_values(v, t).map_or(v == t, |o| o == Ordering::Equal),
    }
}

/// Compare two values numerically/lexicographically.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Apply sorting to records. Missing values sort first.
fn sort_records(records: &mut [Record], sort: &RemoteSort) {
    records.sort_by(|a, b| {
        let cmp = match (a.get(&sort.field), b.get(&sort.field)) {
            (Some(av), Some(bv)) => compare_values(av, bv).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if sort.ascending {
            cmp
        } else {
            cmp.reverse()
        }
    });
}

#[async_trait]
impl RemoteRecordApi for MemoryRecordStore {
    async fn create_record(&self, table: &str, data: Record) -> RemoteResult<RecordResponse> {
        let mut state = self.state.write().await;
        state.calls.push(RemoteCall::Create {
            table: table.to_string(),
        });
        let point = FailurePoint::Create {
            table: table.to_string(),
        };
        if state.failures.contains(&point) {
            return Err(injected(&point));
        }

        let mut record = to_wire(data);
        if record_id(&record).is_none() {
            record.insert("_id".into(), Value::String(uuid::Uuid::new_v4().simple().to_string()));
        }
        let now = now_text();
        record.entry("createdAt".into()).or_insert_with(|| now.clone());
        record.insert("updatedAt".into(), now);

        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        tracing::trace!(table, "memory store: created record");

        Ok(RecordResponse { data: Some(record) })
    }

    async fn get_records(&self, table: &str, query: &RecordQuery) -> RemoteResult<RecordsResponse> {
        let mut state = self.state.write().await;
        state.calls.push(RemoteCall::Get {
            table: table.to_string(),
        });
        let point = FailurePoint::Get {
            table: table.to_string(),
        };
        if state.failures.contains(&point) {
            return Err(injected(&point));
        }

        let mut matched: Vec<Record> = state
            .tables
            .get(table)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| matches_filter(r, &query.filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            sort_records(&mut matched, sort);
        }

        let limit = query.pagination.limit as usize;
        let skip = query.pagination.page as usize * limit;
        let page = matched.into_iter().skip(skip).take(limit).collect();

        Ok(RecordsResponse { data: Some(page) })
    }

    async fn edit_record_by_id(
        &self,
        table: &str,
        id: &str,
        data: Record,
    ) -> RemoteResult<RecordResponse> {
        let mut state = self.state.write().await;
        state.calls.push(RemoteCall::Edit {
            table: table.to_string(),
            id: id.to_string(),
        });
        let point = FailurePoint::Edit { id: id.to_string() };
        if state.failures.contains(&point) {
            return Err(injected(&point));
        }

        let record = state
            .tables
            .get_mut(table)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|r| record_id(r).as_deref() == Some(id))
            })
            .ok_or_else(|| not_found(table, id))?;

        record.extend(to_wire(data));
        record.insert("updatedAt".into(), now_text());

        Ok(RecordResponse {
            data: Some(record.clone()),
        })
    }

    async fn delete_record_by_id(&self, table: &str, id: &str) -> RemoteResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(RemoteCall::Delete {
            table: table.to_string(),
            id: id.to_string(),
        });
        let point = FailurePoint::Delete { id: id.to_string() };
        if state.failures.contains(&point) {
            return Err(injected(&point));
        }

        let records = state
            .tables
            .get_mut(table)
            .ok_or_else(|| not_found(table, id))?;
        let pos = records
            .iter()
            .position(|r| record_id(r).as_deref() == Some(id))
            .ok_or_else(|| not_found(table, id))?;
        records.remove(pos);
        Ok(())
    }
}
