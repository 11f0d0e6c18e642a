//! Response envelope for table queries.

use crate::service::QueryResult;
use serde::Serialize;
use serde_json::Value;

/// `{data, count, filteredCount}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub data: Vec<Value>,
    pub count: u64,
    pub filtered_count: u64,
}

impl From<QueryResult> for QueryResponse {
    fn from(r: QueryResult) -> Self {
        QueryResponse {
            data: r.rows,
            count: r.total_count,
            filtered_count: r.filtered_count,
        }
    }
}
