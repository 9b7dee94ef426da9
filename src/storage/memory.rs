//! In-process storage, used by tests and dry runs.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::storage::{SeenState, SeenStore};

/// Keeps the seen state in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: RwLock<Option<SeenState>>,
    saves: AtomicUsize,
    fail_load: bool,
    fail_save: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state.
    pub fn with_state(state: SeenState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
            ..Self::default()
        }
    }

    /// Make every `load` fail.
    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Make every `save` fail.
    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last saved (or initial) state.
    pub async fn snapshot(&self) -> Option<SeenState> {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl SeenStore for MemoryStorage {
    async fn load(&self) -> Result<SeenState> {
        if self.fail_load {
            return Err(AppError::StoreLoad("memory store set to fail".into()));
        }
        Ok(self.state.read().await.clone().unwrap_or_default())
    }

    async fn save(&self, state: &SeenState) -> Result<()> {
        if self.fail_save {
            return Err(AppError::StoreSave("memory store set to fail".into()));
        }
        *self.state.write().await = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
