//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::Config;
use crate::pipeline::SegmentPipeline;
use crate::progress::ProgressTracker;
use super::handlers;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SegmentPipeline>,
    pub progress: Arc<ProgressTracker>,
}

/// Build the application router with all routes and middleware
pub fn build_router(config: &Config, progress: Arc<ProgressTracker>) -> Router {
    let pipeline = Arc::new(SegmentPipeline::new(config, progress.clone()));
    let app_state = AppState { pipeline, progress };

    // Configure CORS to allow browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/generate", post(handlers::generate))
        .route("/progress", get(handlers::progress))
        .route("/health", get(handlers::health))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(config: Arc<Config>, progress: Arc<ProgressTracker>) -> Result<()> {
    let app = build_router(&config, progress);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🌐 API server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
