//! Table list handler: parse the intent, run the statements, return `{data, count, filteredCount}`.

use crate::error::AppError;
use crate::extractors::IntentQuery;
use crate::intent::QueryIntent;
use crate::response::QueryResponse;
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, Path, State},
    Json,
};
use std::net::SocketAddr;

pub async fn list(
    State(state): State<AppState>,
    Path(route_name): Path<String>,
    remote: Option<ConnectInfo<SocketAddr>>,
    IntentQuery(raw): IntentQuery,
) -> Result<Json<QueryResponse>, AppError> {
    let table = state
        .tables
        .table_by_route(&route_name)
        .ok_or_else(|| AppError::NotFound(route_name.clone()))?;
    let ip = remote.map(|ConnectInfo(addr)| addr);
    tracing::info!(route = %route_name, query = ?raw, ip = ?ip, "incoming request");
    let intent = QueryIntent::parse(&raw, &state.limits)?;
    let result = state.service.query(table, &intent).await?;
    Ok(Json(result.into()))
}
