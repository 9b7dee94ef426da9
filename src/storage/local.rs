//! Local filesystem storage.
//!
//! The whole seen state lives in a single JSON file. Writes go to a sibling
//! temp file first and are renamed into place, so a crash mid-write leaves the
//! previous file intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{SeenState, SeenStore};

/// JSON file backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl SeenStore for LocalStorage {
    async fn load(&self) -> Result<SeenState> {
        match self.read_bytes().await {
            Ok(Some(bytes)) => SeenState::from_json(&bytes)
                .map_err(|e| AppError::StoreLoad(format!("{}: {}", self.describe(), e))),
            Ok(None) => {
                log::info!("No seen state at {}, starting empty", self.describe());
                Ok(SeenState::new())
            }
            Err(e) => Err(AppError::StoreLoad(format!("{}: {}", self.describe(), e))),
        }
    }

    async fn save(&self, state: &SeenState) -> Result<()> {
        let bytes = state.to_json()?;
        self.write_bytes(&bytes)
            .await
            .map_err(|e| AppError::StoreSave(format!("{}: {}", self.describe(), e)))?;
        log::info!(
            "Saved {} jobs across {} sources to {}",
            state.total_jobs(),
            state.source_count(),
            self.describe()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
