//! Table API: read-only REST endpoints over SQLite tables with filtering, sorting and pagination.

pub mod case;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod intent;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{ReadConsistency, Settings, TableRegistry};
pub use error::{AppError, BuildError, ConfigError, ExecutionError, ParseError};
pub use intent::{QueryIntent, QueryLimits, RawQuery, SafeIdentifier};
pub use response::QueryResponse;
pub use routes::{app, common_routes, table_routes};
pub use service::{QueryResult, QueryService};
pub use sql::{build, BindValue, ParameterizedStatement, StatementSet};
pub use state::AppState;
pub use store::{SqliteStore, Store};
