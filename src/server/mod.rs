pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::error::Result;
use crate::generate::Orchestrator;
use crate::storage::ProfileStore;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<ProfileStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/reviews", get(handlers::get_reviews))
        .route("/reviews/stream", get(handlers::stream_reviews))
        .route("/profile/:slug", get(handlers::get_profile))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
