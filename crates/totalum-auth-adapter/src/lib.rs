// totalum-auth-adapter — Totalum storage adapter for the auth layer.
//
// Implements the core `Adapter` trait on top of the Totalum record API.
// `naming` translates field names and records between the two casing
// conventions, `query` compiles WHERE clauses into Totalum filters, and
// `adapter` orchestrates the remote calls.

pub mod adapter;
pub mod naming;
pub mod query;

pub use adapter::{TotalumAdapter, TotalumAdapterConfig};
