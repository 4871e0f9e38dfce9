//! Web server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use super::handlers;
use super::state::AppState;

/// Build the router for the web UI
pub fn router(state: Arc<AppState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // HTML pages
        .route("/", get(handlers::index))
        .nest_service("/html", ServeDir::new(&state.html_dir))
        // API endpoints
        .route("/api/health", get(handlers::health))
        .route("/api/scores", get(handlers::api_list_scores))
        .route("/api/score", get(handlers::api_get_score))
        .route("/api/scores/refresh", post(handlers::api_refresh))
        .layer(cors)
        .with_state(state)
}

/// Start the web UI server
pub async fn start_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let state = Arc::new(state);

    let count = state.reload().await;
    info!("Loaded {} scores from {:?}", count, state.store.path());

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting web UI server on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
