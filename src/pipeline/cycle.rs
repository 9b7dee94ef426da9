//! One ingest cycle: load, extract, reconcile, notify, persist.
//!
//! Sources run one after another in registry order. A source that errors,
//! times out, is cancelled or is rejected by the scrape guard keeps its stored
//! entry and contributes nothing new; every other source proceeds. The sink is
//! called once and the store saved once, whatever happened before.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Config, JobRecord};
use crate::notify::NotificationSink;
use crate::services::{SourceExtractor, SourceRegistry};
use crate::storage::{SeenState, SeenStore};
use crate::utils::http::create_async_client;

use super::circuit_breaker::ScrapeGuard;
use super::reconcile::Reconciler;
use super::stats::ScrapeStats;

/// New jobs of one cycle, keyed by source in registry order.
pub type CycleResult = IndexMap<String, Vec<JobRecord>>;

/// How one source fared in a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Succeeded {
        found: usize,
        new: usize,
        updated: usize,
        stale: usize,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    #[serde(flatten)]
    pub status: SourceStatus,
    pub duration_ms: u64,
}

impl SourceReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, SourceStatus::Failed { .. })
    }

    pub fn new_count(&self) -> usize {
        match self.status {
            SourceStatus::Succeeded { new, .. } => new,
            SourceStatus::Failed { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Clean,
    PartialFailure,
}

/// Outcome of one completed cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
    /// The sink accepted the cycle result
    pub notified: bool,
    /// The seen state was written back
    pub persisted: bool,
    /// Cancellation was requested during the cycle
    pub cancelled: bool,
}

impl CycleReport {
    #[cfg(test)]
    pub(crate) fn empty(at: DateTime<Utc>) -> Self {
        Self {
            started_at: at,
            finished_at: at,
            sources: Vec::new(),
            notified: true,
            persisted: true,
            cancelled: false,
        }
    }

    pub fn has_partial_failure(&self) -> bool {
        self.sources.iter().any(SourceReport::is_failed)
    }

    pub fn total_new(&self) -> usize {
        self.sources.iter().map(SourceReport::new_count).sum()
    }

    pub fn failed_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| s.is_failed())
            .map(|s| s.source.as_str())
            .collect()
    }

    pub fn status(&self) -> CycleStatus {
        if self.has_partial_failure() {
            CycleStatus::PartialFailure
        } else {
            CycleStatus::Clean
        }
    }

    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Time budgets and safeguards for a cycle.
#[derive(Debug, Clone)]
pub struct CycleOptions {
    /// Upper bound for one source's extraction
    pub source_timeout: Duration,
    /// Upper bound for loading, notifying and saving
    pub io_timeout: Duration,
    pub guard: Option<ScrapeGuard>,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            source_timeout: Duration::from_secs(60),
            io_timeout: Duration::from_secs(60),
            guard: None,
        }
    }
}

impl CycleOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_timeout: config.http.source_timeout(),
            io_timeout: config.http.source_timeout(),
            guard: ScrapeGuard::from_config(&config.reconcile),
        }
    }
}

/// Runs cycles against one store, one at a time.
pub struct CycleRunner {
    registry: SourceRegistry,
    store: Arc<dyn SeenStore>,
    sink: Arc<dyn NotificationSink>,
    stats: Arc<ScrapeStats>,
    options: CycleOptions,
    reconciler: Reconciler,
    cycle_lock: Mutex<()>,
    listing: RwLock<Option<SeenState>>,
}

impl CycleRunner {
    pub fn new(
        registry: SourceRegistry,
        store: Arc<dyn SeenStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            registry,
            store,
            sink,
            stats: Arc::new(ScrapeStats::new()),
            options: CycleOptions::default(),
            reconciler: Reconciler::new(),
            cycle_lock: Mutex::new(()),
            listing: RwLock::new(None),
        }
    }

    /// Build the configured sources around `store` and `sink`.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn SeenStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let client = create_async_client(&config.http)?;
        let registry = SourceRegistry::from_config(config, client)?;
        Ok(Self::new(registry, store, sink).with_options(CycleOptions::from_config(config)))
    }

    pub fn with_options(mut self, options: CycleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_stats(mut self, stats: Arc<ScrapeStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn stats(&self) -> Arc<ScrapeStats> {
        Arc::clone(&self.stats)
    }

    pub fn store(&self) -> &dyn SeenStore {
        self.store.as_ref()
    }

    /// Run one cycle to completion.
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_with_cancel(&CancellationToken::new()).await
    }

    /// Run one cycle, abandoning extraction once `cancel` fires.
    ///
    /// Sources not yet finished when cancellation arrives are reported as
    /// failed; the cycle still notifies and persists what was reconciled.
    pub async fn run_cycle_with_cancel(&self, cancel: &CancellationToken) -> CycleReport {
        let _cycle = self.cycle_lock.lock().await;
        let started_at = Utc::now();
        let timer = Instant::now();

        log::info!(
            "Starting cycle over {} sources: {}",
            self.registry.len(),
            self.registry.ids().join(", ")
        );

        let mut state = self.load_state().await;
        let mut new_jobs = CycleResult::new();
        let mut sources = Vec::with_capacity(self.registry.len());

        for extractor in self.registry.iter() {
            let source = extractor.id().to_string();
            let source_timer = Instant::now();

            let status = match self.scrape(extractor, &state, cancel).await {
                Ok(fresh) => {
                    let outcome = self.reconciler.reconcile(&source, &fresh, &mut state);
                    if fresh.is_empty() {
                        log::warn!("[{}] returned no jobs", source);
                    }
                    let status = SourceStatus::Succeeded {
                        found: outcome.found(),
                        new: outcome.new.len(),
                        updated: outcome.updated.len(),
                        stale: outcome.stale.len(),
                    };
                    new_jobs.insert(source.clone(), outcome.new);
                    status
                }
                Err(e) => {
                    log::warn!("[{}] skipped this cycle: {}", source, e);
                    new_jobs.insert(source.clone(), Vec::new());
                    SourceStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };

            sources.push(SourceReport {
                source,
                status,
                duration_ms: source_timer.elapsed().as_millis() as u64,
            });
        }

        let notified = self.notify(&new_jobs).await;
        let persisted = self.persist(&state).await;
        *self.listing.write().await = Some(state);

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            sources,
            notified,
            persisted,
            cancelled: cancel.is_cancelled(),
        };
        self.stats.record(&report, timer.elapsed()).await;

        match report.status() {
            CycleStatus::Clean => log::info!(
                "Cycle complete: {} new jobs in {:.1}s",
                report.total_new(),
                timer.elapsed().as_secs_f64()
            ),
            CycleStatus::PartialFailure => log::warn!(
                "Cycle complete with partial failure ({}): {} new jobs",
                report.failed_sources().join(", "),
                report.total_new()
            ),
        }
        report
    }

    /// The last materialized listing, loading it from the store before the
    /// first cycle.
    pub async fn current_listing(&self) -> SeenState {
        if let Some(state) = self.listing.read().await.as_ref() {
            return state.clone();
        }
        let state = self.load_state().await;
        let mut listing = self.listing.write().await;
        listing.get_or_insert(state).clone()
    }

    async fn load_state(&self) -> SeenState {
        match tokio::time::timeout(self.options.io_timeout, self.store.load_or_empty()).await {
            Ok(state) => state,
            Err(_) => {
                log::warn!(
                    "Loading seen state from {} timed out. Starting empty.",
                    self.store.describe()
                );
                SeenState::new()
            }
        }
    }

    /// Extract one source under its time budget and the scrape guard.
    async fn scrape(
        &self,
        extractor: &dyn SourceExtractor,
        state: &SeenState,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobRecord>> {
        let source = extractor.id();
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled {
                source_id: source.to_string(),
            });
        }

        let fresh = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(AppError::Cancelled { source_id: source.to_string() });
            }
            outcome = tokio::time::timeout(self.options.source_timeout, extractor.extract()) => {
                outcome.map_err(|_| AppError::Timeout {
                    source_id: source.to_string(),
                    secs: self.options.source_timeout.as_secs(),
                })??
            }
        };

        if let Some(guard) = &self.options.guard {
            guard.validate(source, fresh.len(), state.entry(source).len())?;
        }
        Ok(fresh)
    }

    async fn notify(&self, new_jobs: &CycleResult) -> bool {
        let channel = self.sink.channel_name();
        match tokio::time::timeout(self.options.io_timeout, self.sink.notify(new_jobs)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                log::error!("Notification via {} failed: {}", channel, e);
                false
            }
            Err(_) => {
                log::error!("Notification via {} timed out", channel);
                false
            }
        }
    }

    async fn persist(&self, state: &SeenState) -> bool {
        match tokio::time::timeout(self.options.io_timeout, self.store.save(state)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                log::error!("{}", e);
                false
            }
            Err(_) => {
                log::error!("Saving seen state to {} timed out", self.store.describe());
                false
            }
        }
    }
}
