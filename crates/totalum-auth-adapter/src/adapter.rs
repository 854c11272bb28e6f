// TotalumAdapter — the storage contract on top of the Totalum record API.
//
// Maps the contract onto Totalum:
// - models → tables (snake_case)
// - camelCase fields → snake_case columns, except Totalum's auto fields
// - id → _id
// - WHERE clauses → Totalum filters (see `query`)
//
// Totalum has no "update/delete where", no server-side count and no
// transactions. Predicate writes are a find followed by one call per
// matched record, count is the length of a capped page, and transactions
// run as a sequential unit of work.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use totalum_auth_core::db::adapter::{
    Adapter, AdapterResult, BatchOutcome, FindManyQuery, WhereClause,
};
use totalum_auth_core::db::unit_of_work::{run_unit_of_work, UnitOfWork};
use totalum_auth_core::db::value::Record;
use totalum_auth_core::error::AdapterError;
use totalum_auth_core::remote::{record_id, RecordQuery, RemoteFilter, RemoteRecordApi};

use crate::naming;
use crate::query;

/// Page size used when `find_many` is called without a limit.
pub const DEFAULT_FIND_LIMIT: u32 = 50;

/// Most records fetched by `count`, `update_many` and `delete_many`.
/// Counts above this are reported as exactly this value.
pub const MAX_BATCH_RECORDS: u32 = 1000;

/// Configuration for the Totalum adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TotalumAdapterConfig {
    /// Emit a debug trace for every adapter call.
    ///
    /// Default: false
    pub debug_logs: bool,

    /// Prefix of Totalum data collections. Kept for configuration
    /// compatibility; table names are not prefixed with it.
    ///
    /// Default: "data_"
    pub collection_prefix: String,
}

impl Default for TotalumAdapterConfig {
    fn default() -> Self {
        Self {
            debug_logs: false,
            collection_prefix: "data_".to_string(),
        }
    }
}

/// Totalum storage adapter.
///
/// Stateless apart from its configuration: every call translates its input,
/// talks to the remote API and translates the result back. Cloning is
/// cheap; clones share the same remote client.
///
/// # Usage
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use totalum_auth_adapter::{TotalumAdapter, TotalumAdapterConfig};
/// use totalum_auth_client::LazyClient;
///
/// let adapter = TotalumAdapter::new(
///     Arc::new(LazyClient::from_env()),
///     TotalumAdapterConfig::default(),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TotalumAdapter {
    client: Arc<dyn RemoteRecordApi>,
    config: TotalumAdapterConfig,
}

impl TotalumAdapter {
    pub fn new(client: Arc<dyn RemoteRecordApi>, config: TotalumAdapterConfig) -> Self {
        Self { client, config }
    }

    /// Get the adapter ID.
    pub fn adapter_id(&self) -> &str {
        "totalum"
    }

    /// Get the adapter name.
    pub fn adapter_name(&self) -> &str {
        "Totalum Adapter"
    }

    pub fn config(&self) -> &TotalumAdapterConfig {
        &self.config
    }

    /// The configured collection prefix (not applied to table names).
    pub fn collection_prefix(&self) -> &str {
        &self.config.collection_prefix
    }

    /// The remote client this adapter talks to.
    pub fn client(&self) -> &Arc<dyn RemoteRecordApi> {
        &self.client
    }

    /// Run `work` as a best-effort "transaction".
    ///
    /// Totalum has no transactions. The callback runs against this adapter's
    /// ordinary operations, in the order it issues them. The first failure
    /// stops the unit and is returned here; writes that already succeeded
    /// are not rolled back.
    pub async fn transaction<F, Fut, T>(&self, work: F) -> AdapterResult<T>
    where
        F: FnOnce(UnitOfWork) -> Fut,
        Fut: Future<Output = AdapterResult<T>>,
    {
        self.trace(format_args!("TRANSACTION: starting (sequential fallback)"));
        let result = run_unit_of_work(Arc::new(self.clone()), work).await;
        match &result {
            Ok(_) => self.trace(format_args!("TRANSACTION: completed")),
            Err(e) => self.trace(format_args!("TRANSACTION: failed: {e}")),
        }
        result
    }

    fn trace(&self, message: std::fmt::Arguments<'_>) {
        if self.config.debug_logs {
            tracing::debug!("[Totalum Adapter] {}", message);
        }
    }

    /// Convert a contract model name to the Totalum table name.
    fn table_name(&self, model: &str) -> String {
        let table = naming::model_to_table_name(model);
        self.trace(format_args!("model '{model}' -> table '{table}'"));
        table
    }

    /// Translate a write payload; the identity is never written.
    fn write_payload(data: &Record) -> Record {
        let mut payload = naming::record_to_remote(data);
        payload.remove(naming::REMOTE_ID_FIELD);
        payload
    }

    /// Fetch one page of remote records.
    async fn fetch(&self, table: &str, query: &RecordQuery) -> AdapterResult<Vec<Record>> {
        let response = self.client.get_records(table, query).await?;
        Ok(response.unwrap_records())
    }

    /// Fetch at most `limit` records matching `filter`, first page only.
    async fn fetch_matching(
        &self,
        table: &str,
        filter: RemoteFilter,
        limit: u32,
    ) -> AdapterResult<Vec<Record>> {
        self.fetch(table, &RecordQuery::new(filter, limit, 0)).await
    }
}

#[async_trait]
impl Adapter for TotalumAdapter {
    fn id(&self) -> &str {
        self.adapter_id()
    }

    async fn create(
        &self,
        model: &str,
        data: Record,
        force_allow_id: bool,
    ) -> AdapterResult<Record> {
        self.trace(format_args!("CREATE on '{model}'"));
        let table = self.table_name(model);
        let mut payload = naming::record_to_remote(&data);
        if !force_allow_id {
            payload.remove(naming::REMOTE_ID_FIELD);
        }

        let response = self.client.create_record(&table, payload).await?;
        let record = response.unwrap_record().ok_or_else(|| AdapterError::Creation {
            model: model.to_string(),
        })?;

        let result = naming::record_to_contract(&record);
        self.trace(format_args!("CREATE result: {result:?}"));
        Ok(result)
    }

    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<Option<Record>> {
        self.trace(format_args!("FIND_ONE on '{model}': {where_clauses:?}"));
        let table = self.table_name(model);
        let filter = query::build_filter(where_clauses);

        let record = self.fetch_matching(&table, filter, 1).await?.into_iter().next();
        match record {
            Some(record) => Ok(Some(naming::record_to_contract(&record))),
            None => {
                self.trace(format_args!("FIND_ONE: not found"));
                Ok(None)
            }
        }
    }

    async fn find_many(&self, model: &str, query_params: FindManyQuery) -> AdapterResult<Vec<Record>> {
        self.trace(format_args!("FIND_MANY on '{model}': {query_params:?}"));
        let table = self.table_name(model);
        let filter = query::build_filter(&query_params.where_clauses);

        let limit = match query_params.limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_FIND_LIMIT,
        };
        // Only exact when offset is a multiple of limit.
        let page = query_params.offset.unwrap_or(0) / limit;

        let mut remote_query = RecordQuery::new(filter, limit, page);
        if let Some(sort) = query::build_sort(&query_params) {
            remote_query = remote_query.with_sort(sort);
        }

        let items = self.fetch(&table, &remote_query).await?;
        self.trace(format_args!("FIND_MANY result count: {}", items.len()));
        Ok(items.iter().map(naming::record_to_contract).collect())
    }

    async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        self.trace(format_args!("COUNT on '{model}'"));
        let table = self.table_name(model);
        let filter = query::build_filter(where_clauses);

        let items = self.fetch_matching(&table, filter, MAX_BATCH_RECORDS).await?;
        self.trace(format_args!("COUNT result: {}", items.len()));
        Ok(items.len() as i64)
    }

    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Record,
    ) -> AdapterResult<Option<Record>> {
        self.trace(format_args!("UPDATE on '{model}': {where_clauses:?}"));
        let table = self.table_name(model);
        let filter = query::build_filter(where_clauses);

        let Some(record) = self.fetch_matching(&table, filter, 1).await?.into_iter().next() else {
            self.trace(format_args!("UPDATE: record not found"));
            return Ok(None);
        };
        let id = record_id(&record).ok_or_else(|| AdapterError::MissingId {
            table: table.clone(),
        })?;

        let response = self
            .client
            .edit_record_by_id(&table, &id, Self::write_payload(&data))
            .await?;
        let Some(updated) = response.unwrap_record() else {
            self.trace(format_args!("UPDATE: remote returned no record for '{id}'"));
            return Ok(None);
        };

        let result = naming::record_to_contract(&updated);
        self.trace(format_args!("UPDATE result: {result:?}"));
        Ok(Some(result))
    }

    async fn update_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Record,
    ) -> AdapterResult<BatchOutcome> {
        self.trace(format_args!("UPDATE_MANY on '{model}': {where_clauses:?}"));
        let table = self.table_name(model);
        let filter = query::build_filter(where_clauses);

        let items = self.fetch_matching(&table, filter, MAX_BATCH_RECORDS).await?;
        let payload = Self::write_payload(&data);

        let mut outcome = BatchOutcome::default();
        for item in &items {
            let Some(id) = record_id(item) else {
                tracing::warn!(table = %table, "UPDATE_MANY skipped a record without _id");
                outcome.record_failure(None, AdapterError::MissingId { table: table.clone() }.to_string());
                continue;
            };
            match self.client.edit_record_by_id(&table, &id, payload.clone()).await {
                Ok(_) => outcome.record_success(),
                Err(e) => {
                    tracing::warn!(table = %table, id = %id, "UPDATE_MANY failed for record: {e}");
                    outcome.record_failure(Some(id), e.to_string());
                }
            }
        }

        self.trace(format_args!(
            "UPDATE_MANY result: {} updated, {} failed",
            outcome.succeeded,
            outcome.failures.len()
        ));
        Ok(outcome)
    }

    async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<()> {
        self.trace(format_args!("DELETE on '{model}': {where_clauses:?}"));
        let table = self.table_name(model);
        let filter = query::build_filter(where_clauses);

        let Some(record) = self.fetch_matching(&table, filter, 1).await?.into_iter().next() else {
            self.trace(format_args!("DELETE: record not found"));
            return Ok(());
        };
        let id = record_id(&record).ok_or_else(|| AdapterError::MissingId {
            table: table.clone(),
        })?;

        self.client.delete_record_by_id(&table, &id).await?;
        self.trace(format_args!("DELETE: removed '{id}'"));
        Ok(())
    }

    async fn delete_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<BatchOutcome> {
        self.trace(format_args!("DELETE_MANY on '{model}': {where_clauses:?}"));
        let table = self.table_name(model);
        let filter = query::build_filter(where_clauses);

        let items = self.fetch_matching(&table, filter, MAX_BATCH_RECORDS).await?;

        let mut outcome = BatchOutcome::default();
        for item in &items {
            let Some(id) = record_id(item) else {
                tracing::warn!(table = %table, "DELETE_MANY skipped a record without _id");
                outcome.record_failure(None, AdapterError::MissingId { table: table.clone() }.to_string());
                continue;
            };
            match self.client.delete_record_by_id(&table, &id).await {
                Ok(()) => outcome.record_success(),
                Err(e) => {
                    tracing::warn!(table = %table, id = %id, "DELETE_MANY failed for record: {e}");
                    outcome.record_failure(Some(id), e.to_string());
                }
            }
        }

        self.trace(format_args!(
            "DELETE_MANY result: {} deleted, {} failed",
            outcome.succeeded,
            outcome.failures.len()
        ));
        Ok(outcome)
    }
}
