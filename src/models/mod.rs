// src/models/mod.rs

//! Domain models for the job watcher.

mod config;
mod job;

// Re-export all public types
pub use config::{
    Config, HttpConfig, LoggingConfig, NotifyConfig, ReconcileConfig, ScheduleConfig,
    ServerConfig, SourcesConfig, StorageBackend, StorageConfig,
};
pub use job::JobRecord;
