//! The personalization API server.
//!
//! Serves the merged collection to the (external) reading UI: a feed
//! endpoint that reframes each selected article through the hosted model,
//! a like endpoint gated on per-session state, and the raw collection.

pub mod handlers;
pub mod session;
pub mod state;

use std::error::Error;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use state::AppState;

/// Build the router over shared state.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/feed", get(handlers::feed))
        .route("/api/like", post(handlers::like))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: AppState, addr: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Serving personalization API");
    axum::serve(listener, app).await?;
    Ok(())
}
