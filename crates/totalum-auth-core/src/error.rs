// Error types for the storage contract and the remote record API.
//
// Translation helpers never fail; every error here originates from a remote
// call, from a create that returned nothing, or from a unit of work that
// stopped after a failure.

/// Failure talking to the remote record store.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The store answered with a non-success HTTP status.
    #[error("Remote store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never completed (connection, TLS, timeout, ...).
    #[error("Remote request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The response body could not be decoded.
    #[error("Could not decode remote response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Internal adapter error.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// `create` got no record back from the remote store.
    #[error("Failed to create {model}")]
    Creation { model: String },

    /// A matched record carried no `_id`, so it cannot be addressed.
    #[error("Record in '{table}' has no _id")]
    MissingId { table: String },

    /// A unit of work refused an operation because an earlier one failed.
    #[error("Unit of work aborted after a failed operation")]
    Aborted,

    /// Remote failures surface unchanged.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AdapterError {
    /// Whether this error came straight from the remote store.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// Result type for remote record API calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
