//! Store access: the read interface the orchestrator consumes and its SQLite implementation.

use crate::config::Settings;
use crate::error::ExecutionError;
use crate::sql::{BindValue, ParameterizedStatement, StatementSet};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, SqliteConnection, SqlitePool, TypeInfo, ValueRef};
use std::str::FromStr;

pub type Record = Map<String, Value>;

/// Results of the three statements read inside one snapshot.
#[derive(Debug)]
pub struct SnapshotRows {
    pub data: Vec<Record>,
    pub total_count: Record,
    pub filtered_count: Record,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Run a statement and return every row.
    async fn run_query(&self, sql: &str, params: &[BindValue]) -> Result<Vec<Record>, ExecutionError>;

    /// Run a statement expected to produce one row (e.g. a COUNT).
    async fn run_scalar_query(&self, sql: &str, params: &[BindValue]) -> Result<Record, ExecutionError>;

    /// Run all three statements against one consistent view of the table.
    async fn run_snapshot(&self, statements: &StatementSet) -> Result<SnapshotRows, ExecutionError>;

    async fn ping(&self) -> Result<(), ExecutionError> {
        self.run_scalar_query("SELECT 1 AS ok", &[]).await.map(|_| ())
    }
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore { pool }
    }

    /// Open the configured database read-only. The file must already exist.
    pub async fn connect(settings: &Settings) -> Result<Self, ExecutionError> {
        let options = SqliteConnectOptions::from_str(&settings.database_url)?
            .read_only(true)
            .create_if_missing(false);
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options)
            .await?;
        tracing::info!(url = %settings.database_url, "database opened");
        Ok(SqliteStore { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn arguments<'q>(params: &[BindValue]) -> Result<SqliteArguments<'q>, ExecutionError> {
    use sqlx::Arguments;
    let mut args = SqliteArguments::default();
    for p in params {
        args.add(p.clone()).map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
}

async fn fetch_all(conn: &mut SqliteConnection, q: &ParameterizedStatement) -> Result<Vec<Record>, ExecutionError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query (snapshot)");
    let rows = sqlx::query_with(&q.sql, arguments(&q.params)?)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(row_to_record).collect()
}

async fn fetch_one(conn: &mut SqliteConnection, q: &ParameterizedStatement) -> Result<Record, ExecutionError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query (snapshot)");
    let row = sqlx::query_with(&q.sql, arguments(&q.params)?)
        .fetch_one(&mut *conn)
        .await?;
    row_to_record(&row)
}

#[async_trait]
impl Store for SqliteStore {
    async fn run_query(&self, sql: &str, params: &[BindValue]) -> Result<Vec<Record>, ExecutionError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let rows = sqlx::query_with(sql, arguments(params)?)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn run_scalar_query(&self, sql: &str, params: &[BindValue]) -> Result<Record, ExecutionError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let row = sqlx::query_with(sql, arguments(params)?)
            .fetch_one(&self.pool)
            .await?;
        row_to_record(&row)
    }

    async fn run_snapshot(&self, statements: &StatementSet) -> Result<SnapshotRows, ExecutionError> {
        let mut tx = self.pool.begin().await?;
        let data = fetch_all(&mut *tx, &statements.data).await?;
        let total_count = fetch_one(&mut *tx, &statements.total_count).await?;
        let filtered_count = fetch_one(&mut *tx, &statements.filtered_count).await?;
        tx.rollback().await?;
        Ok(SnapshotRows {
            data,
            total_count,
            filtered_count,
        })
    }
}

fn row_to_record(row: &SqliteRow) -> Result<Record, ExecutionError> {
    let mut map = Map::new();
    for col in row.columns() {
        let v = cell_to_value(row, col.ordinal())?;
        map.insert(col.name().to_string(), v);
    }
    Ok(map)
}

/// Decode by the value's storage class rather than the declared column type.
fn cell_to_value(row: &SqliteRow, idx: usize) -> Result<Value, ExecutionError> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_string();
    Ok(match storage.as_str() {
        "INTEGER" | "BOOLEAN" => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
        "REAL" => serde_json::Number::from_f64(row.try_get_unchecked::<f64, _>(idx)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => Value::from(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
    })
}
