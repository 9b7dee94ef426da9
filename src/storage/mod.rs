//! Seen-state persistence.
//!
//! The seen state is one JSON object keyed by source id, each value the list of
//! jobs last known for that source:
//!
//! ```text
//! {
//!   "stripe":   [ { "title": ..., "link": ..., "site": "stripe", ... } ],
//!   "atlassian": [ ... ]
//! }
//! ```
//!
//! It is loaded once at the start of a cycle and saved once at the end.

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{JobRecord, StorageBackend, StorageConfig};

pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Jobs believed to currently exist, per source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenState {
    sources: BTreeMap<String, Vec<JobRecord>>,
}

impl SeenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs last recorded for `source`; empty when the source is unknown.
    pub fn entry(&self, source: &str) -> &[JobRecord] {
        self.sources.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the source has an entry at all (even an empty one).
    pub fn contains(&self, source: &str) -> bool {
        self.sources.contains_key(source)
    }

    /// Replace one source's entry wholesale, returning the previous one.
    pub fn replace_entry(
        &mut self,
        source: impl Into<String>,
        jobs: Vec<JobRecord>,
    ) -> Option<Vec<JobRecord>> {
        self.sources.insert(source.into(), jobs)
    }

    pub fn total_jobs(&self) -> usize {
        self.sources.values().map(Vec::len).sum()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Entries in source id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[JobRecord])> {
        self.sources
            .iter()
            .map(|(source, jobs)| (source.as_str(), jobs.as_slice()))
    }

    /// Stamp every record with the key it is stored under.
    ///
    /// Older files may carry records without a `site` field.
    pub fn backfill_sources(&mut self) {
        for (source, jobs) in self.sources.iter_mut() {
            for job in jobs.iter_mut().filter(|j| j.source.is_empty()) {
                job.source = source.clone();
            }
        }
    }

    /// Parse a persisted state document.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let mut state: Self = serde_json::from_slice(bytes)?;
        state.backfill_sources();
        Ok(state)
    }

    /// Render the state as pretty-printed JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// Load/save contract for the seen state.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Read the stored state. A missing document is an empty state.
    async fn load(&self) -> Result<SeenState>;

    /// Replace the stored state as a whole.
    async fn save(&self, state: &SeenState) -> Result<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Like [`SeenStore::load`], but any failure yields an empty state.
    async fn load_or_empty(&self) -> SeenState {
        match self.load().await {
            Ok(state) => state,
            Err(e) => {
                log::warn!(
                    "Could not load seen state from {}: {}. Starting empty.",
                    self.describe(),
                    e
                );
                SeenState::new()
            }
        }
    }
}

/// Open the store selected by the storage section.
pub async fn store_from_config(config: &StorageConfig) -> Result<Arc<dyn SeenStore>> {
    match config.backend {
        StorageBackend::Local => Ok(Arc::new(LocalStorage::new(&config.seen_file))),
        #[cfg(feature = "s3")]
        StorageBackend::S3 => Ok(Arc::new(S3Storage::from_config(config).await?)),
        #[cfg(not(feature = "s3"))]
        StorageBackend::S3 => Err(crate::error::AppError::config(
            "storage.backend = \"s3\" requires the `s3` feature",
        )),
    }
}
