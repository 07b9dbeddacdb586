use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agent::SqlAgent;

pub mod page;
pub mod routes;

/// Server state
pub struct AppState {
    pub agent: SqlAgent,
    pub database_path: PathBuf,
    pub model: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/ask", post(routes::ask))
        .route("/api/health", get(routes::health))
        .route("/api/records", get(routes::records))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);

    tracing::info!("Starting server on {}", addr);
    crate::ui::success(&format!("Server running at http://{}", addr));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
