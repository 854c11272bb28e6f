// Lazily-built client handle.
//
// Holds the configuration and constructs the HTTP client on first use, so a
// composition root can create the adapter before credentials are validated.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use totalum_auth_core::db::value::Record;
use totalum_auth_core::error::RemoteResult;
use totalum_auth_core::remote::{RecordQuery, RecordResponse, RecordsResponse, RemoteRecordApi};

use crate::client::TotalumClient;
use crate::config::ClientConfig;

/// A [`TotalumClient`] built on first call.
#[derive(Debug)]
pub struct LazyClient {
    config: ClientConfig,
    client: OnceCell<TotalumClient>,
}

impl LazyClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Handle configured from `TOTALUM_API_KEY` / `TOTALUM_API_URL`.
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether the underlying client has been built yet.
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    /// The underlying client, building it if needed.
    pub async fn client(&self) -> RemoteResult<&TotalumClient> {
        self.client
            .get_or_try_init(|| async {
                tracing::debug!(base_url = %self.config.base_url, "initialising totalum client");
                TotalumClient::new(self.config.clone())
            })
            .await
    }
}

#[async_trait]
impl RemoteRecordApi for LazyClient {
    async fn create_record(&self, table: &str, data: Record) -> RemoteResult<RecordResponse> {
        self.client().await?.create_record(table, data).await
    }

    async fn get_records(&self, table: &str, query: &RecordQuery) -> RemoteResult<RecordsResponse> {
        self.client().await?.get_records(table, query).await
    }

    async fn edit_record_by_id(
        &self,
        table: &str,
        id: &str,
        data: Record,
    ) -> RemoteResult<RecordResponse> {
        self.client().await?.edit_record_by_id(table, id, data).await
    }

    async fn delete_record_by_id(&self, table: &str, id: &str) -> RemoteResult<()> {
        self.client().await?.delete_record_by_id(table, id).await
    }
}
