pub mod adapter;
pub mod unit_of_work;
pub mod value;

pub use adapter::{
    Adapter, AdapterResult, BatchFailure, BatchOutcome, Connector, FindManyQuery, Operator,
    SortBy, SortDirection, WhereClause,
};
pub use unit_of_work::{run_unit_of_work, UnitOfWork};
pub use value::{format_timestamp, record_from_json, Record, Value};
