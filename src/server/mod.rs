//! HTTP front door.
//!
//! | Route | |
//! |---|---|
//! | `GET /health` | liveness |
//! | `GET /jobs` | run a cycle (unless the last one is fresh) and return the listing |
//! | `GET /top_jobs` | keyword-filtered listing |
//! | `GET /stats` | job counts and cycle timings |
//! | `GET /logs?lines=N` | tail of the log file |

mod handlers;
mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{AppError, Result};

pub use state::{AppState, ResponseCache};

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/jobs", get(handlers::jobs))
        .route("/top_jobs", get(handlers::top_jobs))
        .route("/stats", get(handlers::stats))
        .route("/logs", get(handlers::logs))
        .layer(cors_layer(&state.config.server.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
        .allow_headers(Any)
}

/// Serve until `shutdown` fires.
pub async fn serve(state: Arc<AppState>, shutdown: CancellationToken) -> Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::config(format!("Cannot bind {}: {}", addr, e)))?;
    log::info!("Server listening on http://{}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
