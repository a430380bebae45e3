//! Record envelope and query types shared by every store user.

mod query;
mod types;

pub use query::{DEFAULT_LIMIT, Filter, Op, Predicate, Query, Window, compare_values, field_of};
pub use types::{Record, RecordId};
