//! Executes the page and count statements and merges them into one result.

use crate::case::value_keys_to_camel_case_recursive;
use crate::config::{ReadConsistency, Settings};
use crate::error::{AppError, ExecutionError};
use crate::intent::{QueryIntent, SafeIdentifier};
use crate::sql::{build, ParameterizedStatement, StatementSet};
use crate::store::{Record, SnapshotRows, Store};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Rows (camelCase keys) plus the unfiltered and filtered row counts.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<Value>,
    pub total_count: u64,
    pub filtered_count: u64,
}

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn Store>,
    timeout: Duration,
    consistency: ReadConsistency,
}

impl QueryService {
    pub fn new(store: Arc<dyn Store>, settings: &Settings) -> Self {
        QueryService {
            store,
            timeout: settings.query_timeout,
            consistency: settings.consistency,
        }
    }

    pub fn with_options(store: Arc<dyn Store>, timeout: Duration, consistency: ReadConsistency) -> Self {
        QueryService {
            store,
            timeout,
            consistency,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Build the statements for `intent` against `table` and execute them.
    pub async fn query(&self, table: &SafeIdentifier, intent: &QueryIntent) -> Result<QueryResult, AppError> {
        let statements = build(table, intent)?;
        Ok(self.execute(&statements).await?)
    }

    /// Run all three statements; either all succeed or the whole request fails.
    /// On timeout the in-flight reads are dropped, which cancels them.
    pub async fn execute(&self, statements: &StatementSet) -> Result<QueryResult, ExecutionError> {
        let reads = async {
            match self.consistency {
                ReadConsistency::Concurrent => {
                    let (data, total_count, filtered_count) = tokio::try_join!(
                        self.store.run_query(&statements.data.sql, &statements.data.params),
                        self.store
                            .run_scalar_query(&statements.total_count.sql, &statements.total_count.params),
                        self.store
                            .run_scalar_query(&statements.filtered_count.sql, &statements.filtered_count.params),
                    )?;
                    Ok::<_, ExecutionError>(SnapshotRows {
                        data,
                        total_count,
                        filtered_count,
                    })
                }
                ReadConsistency::Snapshot => self.store.run_snapshot(statements).await,
            }
        };
        let rows = tokio::time::timeout(self.timeout, reads)
            .await
            .map_err(|_| ExecutionError::Timeout(self.timeout))??;

        let total_count = count_of(&rows.total_count, &statements.total_count)?;
        let filtered_count = count_of(&rows.filtered_count, &statements.filtered_count)?;
        let rows = rows
            .data
            .into_iter()
            .map(|record| {
                let mut v = Value::Object(record);
                value_keys_to_camel_case_recursive(&mut v);
                v
            })
            .collect();
        Ok(QueryResult {
            rows,
            total_count,
            filtered_count,
        })
    }
}

fn count_of(record: &Record, statement: &ParameterizedStatement) -> Result<u64, ExecutionError> {
    record
        .get("count")
        .and_then(Value::as_u64)
        .ok_or_else(|| ExecutionError::MissingCount(statement.sql.clone()))
}
