use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::pipeline::{TopJobs, top_jobs as filter_top_jobs};
use crate::storage::SeenState;

use super::AppState;

const DEFAULT_LOG_LINES: usize = 500;

/// Error body shaped as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

/// Run a cycle unless the cache is fresh, then return the whole listing.
pub async fn jobs(State(state): State<Arc<AppState>>) -> Json<SeenState> {
    log::info!("[Scrape] API /jobs called");
    if let Some(report) = state.cache.refresh(&state.runner, &state.shutdown).await {
        log::info!(
            "[Scrape] finished in {:.2}s ({:?})",
            report.duration().as_secs_f64(),
            report.status()
        );
    }
    Json(state.runner.current_listing().await)
}

pub async fn top_jobs(State(state): State<Arc<AppState>>) -> Json<TopJobs> {
    let listing = state.runner.current_listing().await;
    Json(filter_top_jobs(&listing, &state.config.server.top_keywords))
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_jobs: usize,
    pub companies: usize,
    pub total_scrapes: u64,
    pub scrape_durations_seconds: f64,
    pub last_scrape: String,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let listing = state.runner.current_listing().await;
    let snapshot = state.runner.stats().snapshot().await;

    Json(StatsResponse {
        total_jobs: listing.total_jobs(),
        companies: listing.source_count(),
        total_scrapes: snapshot.total_cycles,
        scrape_durations_seconds: (snapshot.average_duration_secs * 100.0).round() / 100.0,
        last_scrape: snapshot
            .last_cycle_at
            .map(|at| {
                at.with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| "N/A".to_string()),
    })
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub lines: Option<usize>,
}

/// Last N lines of the configured log file.
pub async fn logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<String, ApiError> {
    let Some(path) = state.config.logging.file.as_deref() else {
        return Err(ApiError::not_found("No log file configured"));
    };
    let lines = query.lines.unwrap_or(DEFAULT_LOG_LINES);
    tail_file(Path::new(path), lines).await
}

async fn tail_file(path: &Path, lines: usize) -> Result<String, ApiError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found(format!("{} not found", path.display())));
        }
        Err(e) => {
            log::error!("[Logs] Error reading log file {}: {}", path.display(), e);
            return Err(ApiError::internal(e.to_string()));
        }
    };
    Ok(tail(&content, lines))
}

fn tail(content: &str, lines: usize) -> String {
    let all: Vec<&str> = content.split_inclusive('\n').collect();
    all[all.len().saturating_sub(lines)..].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        let content = "a\nb\nc\n";
        assert_eq!(tail(content, 2), "b\nc\n");
        assert_eq!(tail(content, 10), content);
        assert_eq!(tail(content, 0), "");
    }

    #[tokio::test]
    async fn missing_log_is_not_found() {
        let err = tail_file(Path::new("/definitely/not/here.log"), 5)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reads_existing_log() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        tokio::fs::write(&path, "one\ntwo\nthree\n").await.unwrap();
        assert_eq!(tail_file(&path, 1).await.unwrap(), "three\n");
    }
}
