//! AWS Lambda entry point for jobwatch
//!
//! Deploy with `cargo lambda build --release --features lambda`
//! Schedule with an EventBridge rule; each invocation runs one cycle.

use lambda_runtime::{Error as LambdaError, service_fn};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("jobwatch Lambda starting...");
    lambda_runtime::run(service_fn(jobwatch::lambda::handler)).await
}
