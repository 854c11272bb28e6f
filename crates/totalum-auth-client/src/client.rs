// HTTP client for the Totalum CRUD API.
//
// Four calls, all authenticated with the `api-key` header:
//
//   POST   {base}api/v1/crud/{table}            create
//   GET    {base}api/v1/crud/{table}?query=...  list (query is JSON)
//   PATCH  {base}api/v1/crud/{table}/{id}       edit
//   DELETE {base}api/v1/crud/{table}/{id}       delete
//
// No retries. Non-2xx answers become `RemoteError::Status`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;

use totalum_auth_core::db::value::Record;
use totalum_auth_core::error::{RemoteError, RemoteResult};
use totalum_auth_core::remote::{RecordQuery, RecordResponse, RecordsResponse, RemoteRecordApi};

use crate::config::ClientConfig;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "api-key";

/// Totalum record API over HTTP.
#[derive(Debug, Clone)]
pub struct TotalumClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl TotalumClient {
    /// Build a client. Fails only if the API key is not a valid header value.
    pub fn new(config: ClientConfig) -> RemoteResult<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| RemoteError::Other(format!("Invalid API key header: {e}")))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(transport)?;

        Ok(Self { http, config })
    }

    /// Client configured from `TOTALUM_API_KEY` / `TOTALUM_API_URL`.
    pub fn from_env() -> RemoteResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Transport(Box::new(e))
}

/// Send a request and return the body of a successful answer.
async fn send(request: reqwest::RequestBuilder) -> RemoteResult<String> {
    let response = request.send().await.map_err(|e| {
        tracing::error!(error = %e, "totalum request failed");
        transport(e)
    })?;

    let status = response.status();
    let body = response.text().await.map_err(transport)?;

    if !status.is_success() {
        tracing::debug!(status = status.as_u16(), "totalum returned an error status");
        return Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

fn decode<T: DeserializeOwned + Default>(body: &str) -> RemoteResult<T> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl RemoteRecordApi for TotalumClient {
    async fn create_record(&self, table: &str, data: Record) -> RemoteResult<RecordResponse> {
        let url = self.config.table_url(table);
        tracing::trace!(%url, "POST");
        let body = send(self.http.post(&url).json(&data)).await?;
        decode(&body)
    }

    async fn get_records(&self, table: &str, query: &RecordQuery) -> RemoteResult<RecordsResponse> {
        let url = self.config.table_url(table);
        let query_json = serde_json::to_string(query)?;
        tracing::trace!(%url, query = %query_json, "GET");
        let body = send(self.http.get(&url).query(&[("query", query_json)])).await?;
        decode(&body)
    }

    async fn edit_record_by_id(
        &self,
        table: &str,
        id: &str,
        data: Record,
    ) -> RemoteResult<RecordResponse> {
        let url = self.config.record_url(table, id);
        tracing::trace!(%url, "PATCH");
        let body = send(self.http.patch(&url).json(&data)).await?;
        decode(&body)
    }

    async fn delete_record_by_id(&self, table: &str, id: &str) -> RemoteResult<()> {
        let url = self.config.record_url(table, id);
        tracing::trace!(%url, "DELETE");
        send(self.http.delete(&url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_api_key_is_rejected() {
        let err = TotalumClient::new(ClientConfig::with_api_key("bad\nkey")).unwrap_err();
        assert!(matches!(err, RemoteError::Other(_)));
    }

    #[test]
    fn test_decode_empty_body() {
        let resp: RecordResponse = decode("").unwrap();
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_decode_envelope() {
        let resp: RecordsResponse = decode(r#"{"data":[{"_id":"a"}]}"#).unwrap();
        assert_eq!(resp.unwrap_records().len(), 1);
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode::<RecordResponse>("not json").unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)));
    }
}
