// src/lambda/mod.rs

//! AWS Lambda handler.
//!
//! One invocation runs one cycle:
//! 1. Loads `config.toml` from S3 (defaults when absent)
//! 2. Loads the seen state from S3
//! 3. Extracts and reconciles every enabled source
//! 4. Sends one digest and writes the state back

use std::sync::Arc;
use std::time::Instant;

use aws_sdk_s3::Client;
use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::config::LambdaConfigLoader;
use crate::error::{AppError, Result};
use crate::notify::{LogNotifier, NotificationSink, sink_from_config};
use crate::pipeline::{CycleReport, CycleRunner, CycleStatus};
use crate::storage::{MemoryStorage, S3Storage, SeenStore};

const DEFAULT_CONFIG_PREFIX: &str = "jobwatch/config";

/// Lambda invocation payload.
#[derive(Debug, Default, Deserialize)]
pub struct CycleRequest {
    /// Reconcile against a copy of the state and only log the digest
    #[serde(default)]
    pub dry_run: bool,
}

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct CycleResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CycleStatus>,

    pub total_new: usize,

    pub failed_sources: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub execution_time_ms: u64,
}

impl CycleResponse {
    fn from_report(report: &CycleReport) -> Self {
        Self {
            success: report.persisted,
            status: Some(report.status()),
            total_new: report.total_new(),
            failed_sources: report
                .failed_sources()
                .into_iter()
                .map(str::to_string)
                .collect(),
            error: (!report.persisted).then(|| "seen state was not saved".to_string()),
            execution_time_ms: 0,
        }
    }
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(
    event: LambdaEvent<CycleRequest>,
) -> std::result::Result<CycleResponse, LambdaError> {
    let start = Instant::now();
    let (request, _context) = event.into_parts();

    info!("Starting cycle: dry_run={}", request.dry_run);

    let mut response = match run_cycle(&request).await {
        Ok(report) => {
            let response = CycleResponse::from_report(&report);
            info!(
                "Cycle completed: {} new, {} failed sources",
                response.total_new,
                response.failed_sources.len()
            );
            response
        }
        Err(e) => {
            error!("Cycle failed: {}", e);
            CycleResponse {
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    };
    response.execution_time_ms = start.elapsed().as_millis() as u64;
    Ok(response)
}

async fn run_cycle(request: &CycleRequest) -> Result<CycleReport> {
    let bucket = std::env::var("S3_BUCKET")
        .map_err(|_| AppError::config("S3_BUCKET environment variable is not set"))?;
    let prefix = config_prefix();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = Client::new(&aws_config);

    let loader = LambdaConfigLoader::new(S3Storage::new(client.clone(), &bucket, ""), &prefix);
    let config = loader.load_config().await?;

    let state_bucket = config.storage.s3_bucket.clone().unwrap_or(bucket);
    let s3: Arc<dyn SeenStore> = Arc::new(S3Storage::new(
        client,
        state_bucket,
        &config.storage.s3_key,
    ));

    let (store, sink): (Arc<dyn SeenStore>, Arc<dyn NotificationSink>) = if request.dry_run {
        warn!("Dry run: state will not be written to {}", s3.describe());
        let state = s3.load().await?;
        (
            Arc::new(MemoryStorage::with_state(state)),
            Arc::new(LogNotifier::new()),
        )
    } else {
        (s3, sink_from_config(&config.notify)?)
    };

    let runner = CycleRunner::from_config(&config, store, sink)?;
    Ok(runner.run_cycle().await)
}

fn config_prefix() -> String {
    std::env::var("JOBWATCH_CONFIG_PREFIX").unwrap_or_else(|_| DEFAULT_CONFIG_PREFIX.to_string())
}
