//! Table query routes. One parameterized path; handlers resolve the table through the registry,
//! so only allow-listed tables are reachable.

use crate::handlers::list;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn table_routes(state: AppState) -> Router {
    Router::new().route("/:route_name", get(list)).with_state(state)
}
