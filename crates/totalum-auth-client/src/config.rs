// Client configuration: API key and base URL, from code or the environment.

use std::fmt;

/// Default Totalum API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.totalum.app/";

/// Key used when `TOTALUM_API_KEY` is unset.
pub const FALLBACK_API_KEY: &str = "test-api-key";

pub const API_KEY_ENV: &str = "TOTALUM_API_KEY";
pub const BASE_URL_ENV: &str = "TOTALUM_API_URL";

/// Connection settings for [`TotalumClient`](crate::TotalumClient).
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    /// Always ends with `/`.
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: with_trailing_slash(base_url.into()),
        }
    }

    /// Config pointing at the default endpoint.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(api_key, DEFAULT_BASE_URL)
    }

    /// Read `TOTALUM_API_KEY` and `TOTALUM_API_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = lookup(API_KEY_ENV)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!(
                    "{API_KEY_ENV} is not set; using placeholder key '{FALLBACK_API_KEY}'"
                );
                FALLBACK_API_KEY.to_string()
            });
        let base_url = lookup(BASE_URL_ENV)
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self::new(api_key, base_url)
    }

    /// Absolute URL of the CRUD endpoint for `table`.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}api/v1/crud/{table}", self.base_url)
    }

    /// Absolute URL of a single record.
    pub fn record_url(&self, table: &str, id: &str) -> String {
        format!("{}/{id}", self.table_url(table))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_api_key(FALLBACK_API_KEY)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
