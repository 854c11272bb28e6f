// totalum-auth-client — HTTP access to the Totalum record API.
//
// `TotalumClient` talks to the REST endpoints; `LazyClient` defers building
// it until the first call. Both implement `RemoteRecordApi` and are injected
// into the adapter as `Arc<dyn RemoteRecordApi>`.

pub mod client;
pub mod config;
pub mod handle;

pub use client::TotalumClient;
pub use config::ClientConfig;
pub use handle::LazyClient;
