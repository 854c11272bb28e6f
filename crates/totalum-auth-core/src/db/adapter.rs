// Storage contract: the interface the auth layer persists through.
//
// create, find_one, find_many, count, update, update_many, delete,
// delete_many. Every backend implements `Adapter`; the auth layer only ever
// talks to `dyn Adapter`. Multi-step work is grouped through
// `crate::db::unit_of_work`.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::value::{Record, Value};
use crate::error::AdapterError;

/// Result type for adapter operations.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

// ─── Where Clause ────────────────────────────────────────────────

/// Comparison operators for WHERE clauses.
///
/// Deserialises from the snake_case name. Unknown names fall back to
/// [`Operator::Eq`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Operator {
    /// Equal (default).
    #[default]
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Value is in the given list.
    In,
    /// Value is not in the given list.
    NotIn,
    /// String contains substring.
    Contains,
    /// String starts with prefix.
    StartsWith,
    /// String ends with suffix.
    EndsWith,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
        }
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        match s {
            "ne" => Self::Ne,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            "contains" => Self::Contains,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            _ => Self::Eq,
        }
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connector of a clause. `Or` clauses are grouped into one
/// disjunction; everything else is conjoined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    #[default]
    And,
    Or,
}

/// A single WHERE condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    /// The field name to filter on, in contract casing.
    pub field: String,
    /// The comparison value.
    #[serde(default)]
    pub value: Value,
    /// The comparison operator (default: Eq).
    #[serde(default)]
    pub operator: Operator,
    /// How this clause combines with the others (default: And).
    #[serde(default)]
    pub connector: Connector,
}

impl WhereClause {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator,
            connector: Connector::And,
        }
    }

    /// Simple equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// Set the AND connector.
    pub fn and(mut self) -> Self {
        self.connector = Connector::And;
        self
    }

    /// Set the OR connector.
    pub fn or(mut self) -> Self {
        self.connector = Connector::Or;
        self
    }
}

// ─── Sort / Pagination ───────────────────────────────────────────

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort specification (field + direction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

impl SortBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Query parameters for `find_many`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyQuery {
    #[serde(default, rename = "where")]
    pub where_clauses: Vec<WhereClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
}

impl FindManyQuery {
    pub fn filtered(where_clauses: Vec<WhereClause>) -> Self {
        Self {
            where_clauses,
            ..Default::default()
        }
    }
}

// ─── Batch Outcome ───────────────────────────────────────────────

/// One record a batch operation could not process.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    /// Identity of the record, if it had one.
    pub id: Option<String>,
    /// Rendered error.
    pub reason: String,
}

/// Result of `update_many` / `delete_many`.
///
/// Per-record failures never abort the batch; they are collected here
/// next to the success count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub succeeded: i64,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, id: Option<String>, reason: impl Into<String>) {
        self.failures.push(BatchFailure {
            id,
            reason: reason.into(),
        });
    }

    /// Number of records that were matched, successful or not.
    pub fn attempted(&self) -> i64 {
        self.succeeded + self.failures.len() as i64
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

// ─── Adapter Trait ───────────────────────────────────────────────

/// The storage contract every backend implements.
///
/// Records are passed in contract casing (`emailVerified`, `userId`, `id`);
/// translating to whatever the backend stores is the adapter's job.
#[async_trait]
pub trait Adapter: Send + Sync + fmt::Debug {
    /// Short backend identifier, e.g. `"totalum"`.
    fn id(&self) -> &str;

    /// Create a new record in the given model.
    ///
    /// The backend assigns the identity unless `force_allow_id` is set, in
    /// which case a caller-supplied `id` is kept.
    async fn create(
        &self,
        model: &str,
        data: Record,
        force_allow_id: bool,
    ) -> AdapterResult<Record>;

    /// Find a single record matching the WHERE clauses.
    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<Option<Record>>;

    /// Find multiple records matching the query parameters.
    async fn find_many(&self, model: &str, query: FindManyQuery) -> AdapterResult<Vec<Record>>;

    /// Count records matching the WHERE clauses.
    async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64>;

    /// Update the first record matching the WHERE clauses.
    /// Returns the updated record, or `None` if nothing matched.
    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Record,
    ) -> AdapterResult<Option<Record>>;

    /// Update every record matching the WHERE clauses.
    async fn update_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Record,
    ) -> AdapterResult<BatchOutcome>;

    /// Delete the first record matching the WHERE clauses.
    async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<()>;

    /// Delete every record matching the WHERE clauses.
    async fn delete_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<BatchOutcome>;
}
