// totalum-auth-core — storage contract and remote record API types.
//
// The auth layer persists through `Adapter`; the Totalum adapter implements
// it on top of `RemoteRecordApi`. Both sides share `Value`/`Record`.

pub mod db;
pub mod env;
pub mod error;
pub mod remote;

// Re-exports for convenience
pub use db::adapter::{Adapter, AdapterResult, BatchOutcome, FindManyQuery, WhereClause};
pub use db::unit_of_work::{run_unit_of_work, UnitOfWork};
pub use db::value::{Record, Value};
pub use error::{AdapterError, RemoteError, RemoteResult};
pub use remote::{RecordQuery, RemoteFilter, RemoteRecordApi};
