//! QueryService: runs the statements for one request and assembles the response.

mod query;
pub use query::{QueryResult, QueryService};
