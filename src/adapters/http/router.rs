use super::handlers::{
    handle_convert, handle_crs_search, handle_export, handle_health, handle_index,
    handle_map_config, handle_parse_table,
};
use super::middleware::logging_middleware;
use super::state::AppState;
use crate::utils::error::{ConverterError, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    tracing::info!("Binding HTTP server on {}", addr);
    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("🚀 HTTP server ready on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| {
            tracing::error!("HTTP server terminated unexpectedly addr={} error={}", addr, err);
            ConverterError::ServerError {
                message: err.to_string(),
            }
        })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let base_path = state.config.base_path.clone();

    let app = Router::new()
        .route("/", get(handle_index))
        .route("/api/crs", get(handle_crs_search))
        .route("/api/map", get(handle_map_config))
        .route("/api/table", post(handle_parse_table))
        .route("/api/convert", post(handle_convert))
        .route("/api/export", post(handle_export))
        .with_state(state.clone());

    // 根路徑無法 nest，直接合併
    let router = Router::new().route("/health", get(handle_health));
    let router = if base_path == "/" {
        router.merge(app)
    } else {
        // nest 只比對 `/base`，另外補上 `/base/`
        router
            .route(
                &format!("{}/", base_path),
                get(handle_index).with_state(state),
            )
            .nest(&base_path, app)
    };

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(logging_middleware))
}
