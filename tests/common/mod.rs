//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use jobwatch::error::{AppError, Result};
use jobwatch::models::JobRecord;
use jobwatch::notify::NotificationSink;
use jobwatch::pipeline::CycleResult;
use jobwatch::services::SourceExtractor;

pub fn job(source: &str, link: &str, title: &str) -> JobRecord {
    JobRecord::new(source, title, link)
}

pub type Listing = Arc<Mutex<Vec<JobRecord>>>;

/// Returns a fixed listing, which can be swapped between cycles through
/// [`FakeSource::listing`].
pub struct FakeSource {
    id: &'static str,
    jobs: Listing,
}

impl FakeSource {
    pub fn new(id: &'static str, jobs: Vec<JobRecord>) -> Self {
        Self {
            id,
            jobs: Arc::new(Mutex::new(jobs)),
        }
    }

    pub fn listing(&self) -> Listing {
        Arc::clone(&self.jobs)
    }
}

#[async_trait]
impl SourceExtractor for FakeSource {
    fn id(&self) -> &str {
        self.id
    }

    async fn extract(&self) -> Result<Vec<JobRecord>> {
        Ok(self.jobs.lock().await.clone())
    }
}

/// Always fails.
pub struct BrokenSource(pub &'static str);

#[async_trait]
impl SourceExtractor for BrokenSource {
    fn id(&self) -> &str {
        self.0
    }

    async fn extract(&self) -> Result<Vec<JobRecord>> {
        Err(AppError::extraction(self.0, "HTTP 503"))
    }
}

/// Never answers within any reasonable budget.
pub struct StalledSource(pub &'static str);

#[async_trait]
impl SourceExtractor for StalledSource {
    fn id(&self) -> &str {
        self.0
    }

    async fn extract(&self) -> Result<Vec<JobRecord>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// Sleeps inside `extract` and tracks how many calls overlap.
pub struct SlowSource {
    id: &'static str,
    jobs: Vec<JobRecord>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: Arc<AtomicUsize>,
}

impl SlowSource {
    pub fn new(id: &'static str, jobs: Vec<JobRecord>, delay: Duration) -> Self {
        Self {
            id,
            jobs,
            delay,
            in_flight: AtomicUsize::new(0),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Highest number of concurrent `extract` calls seen.
    pub fn peak(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.peak)
    }
}

#[async_trait]
impl SourceExtractor for SlowSource {
    fn id(&self) -> &str {
        self.id
    }

    async fn extract(&self) -> Result<Vec<JobRecord>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.jobs.clone())
    }
}

/// Keeps every cycle result it is handed.
#[derive(Default)]
pub struct RecordingSink {
    pub calls: Mutex<Vec<CycleResult>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub async fn calls(&self) -> Vec<CycleResult> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, new_jobs: &CycleResult) -> Result<()> {
        self.calls.lock().await.push(new_jobs.clone());
        if self.fail {
            return Err(AppError::notify("recording", "mailbox full"));
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

pub fn links(jobs: &[JobRecord]) -> Vec<&str> {
    jobs.iter().map(|j| j.link.as_str()).collect()
}
