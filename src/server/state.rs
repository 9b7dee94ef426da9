use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::models::Config;
use crate::pipeline::{CycleReport, CycleRunner};

/// Shared state behind every route.
pub struct AppState {
    pub runner: Arc<CycleRunner>,
    pub config: Arc<Config>,
    pub cache: ResponseCache,
    /// Cancelled when the server shuts down
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(runner: Arc<CycleRunner>, config: Arc<Config>, shutdown: CancellationToken) -> Self {
        let ttl = Duration::from_secs(config.server.cache_ttl_secs);
        Self {
            runner,
            config,
            cache: ResponseCache::new(ttl),
            shutdown,
        }
    }
}

/// Remembers when `/jobs` last ran a cycle.
///
/// Requests inside the TTL reuse the materialized listing; concurrent
/// requests past it wait for one shared cycle.
pub struct ResponseCache {
    ttl: Duration,
    last_cycle: Mutex<Option<Instant>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            last_cycle: Mutex::new(None),
        }
    }

    /// Run a cycle on `runner` unless one finished within the TTL.
    ///
    /// Returns the report when a cycle ran. The cycle runs on its own task so a
    /// dropped request cannot abandon it halfway.
    pub async fn refresh(
        &self,
        runner: &Arc<CycleRunner>,
        cancel: &CancellationToken,
    ) -> Option<CycleReport> {
        let mut last = self.last_cycle.lock().await;
        if last.is_some_and(|at| at.elapsed() < self.ttl) {
            log::debug!("Serving cached listing");
            return None;
        }

        let runner = Arc::clone(runner);
        let cancel = cancel.child_token();
        let handle = tokio::spawn(async move { runner.run_cycle_with_cancel(&cancel).await });
        match handle.await {
            Ok(report) => {
                *last = Some(Instant::now());
                Some(report)
            }
            Err(e) => {
                log::error!("Cycle task failed: {}", e);
                None
            }
        }
    }
}
