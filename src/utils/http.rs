// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Send a request, turning transport errors and non-2xx statuses into
/// extraction errors for `source`.
pub async fn send_checked(
    source: &str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response> {
    request
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| AppError::extraction(source, e))
}

/// Fetch a page body as text.
///
/// HTML is parsed by the caller outside of async code.
pub async fn fetch_text(source: &str, request: reqwest::RequestBuilder) -> Result<String> {
    send_checked(source, request)
        .await?
        .text()
        .await
        .map_err(|e| AppError::extraction(source, e))
}

/// Fetch and decode a JSON document.
pub async fn fetch_json<T: DeserializeOwned>(
    source: &str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let bytes = send_checked(source, request)
        .await?
        .bytes()
        .await
        .map_err(|e| AppError::extraction(source, e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::extraction(source, format!("invalid JSON: {e}")))
}
