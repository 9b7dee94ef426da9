// src/error.rs

//! Unified error handling for the job watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for job watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A source failed to fetch or parse its listing
    #[error("Extraction failed for {source_id}: {message}")]
    Extraction { source_id: String, message: String },

    /// A source did not finish within its time budget
    #[error("Extraction for {source_id} timed out after {secs}s")]
    Timeout { source_id: String, secs: u64 },

    /// A source's extraction was abandoned because the cycle was cancelled
    #[error("Extraction for {source_id} was cancelled")]
    Cancelled { source_id: String },

    /// The empty-scrape guard rejected a suspicious result
    #[error("Guard rejected scrape for {source_id}: {current} jobs, previously {previous}")]
    SuspiciousScrape {
        source_id: String,
        current: usize,
        previous: usize,
    },

    /// Seen-state could not be read
    #[error("Failed to load seen state: {0}")]
    StoreLoad(String),

    /// Seen-state could not be written
    #[error("Failed to save seen state: {0}")]
    StoreSave(String),

    /// Notification delivery failed
    #[error("Notification via {channel} failed: {message}")]
    Notify { channel: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an extraction error for a source.
    pub fn extraction(source: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Extraction {
            source_id: source.into(),
            message: message.to_string(),
        }
    }

    /// Create a notification error for a channel.
    pub fn notify(channel: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Notify {
            channel: channel.into(),
            message: message.to_string(),
        }
    }
}
