//! Server: reads settings from the environment, opens the database read-only, and serves one GET route per
//! allow-listed table plus the common routes.

use std::net::SocketAddr;
use std::sync::Arc;
use table_api::{app, AppState, Settings, SqliteStore};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("table_api=info,server=info,tower_http=info")),
        )
        .init();

    let store = SqliteStore::connect(&settings).await?;
    let state = AppState::new(Arc::new(store), &settings)?;
    for route in state.tables.routes() {
        tracing::info!(route = %format!("/{}", route.route_name), table = %route.table, "route registered");
    }

    let listener = TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, consistency = ?settings.consistency, "server listening");
    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
