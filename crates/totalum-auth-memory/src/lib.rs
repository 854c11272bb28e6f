// totalum-auth-memory — in-memory stand-in for the Totalum record API.
//
// Uses a HashMap-based store so adapters can be exercised without a
// network. Records call history and supports injected failures.

pub mod store;

pub use store::{FailurePoint, MemoryRecordStore, RemoteCall};
