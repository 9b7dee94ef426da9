//! Log-only notifier.

use async_trait::async_trait;
use chrono::Local;

use crate::error::Result;
use crate::notify::{Digest, NotificationSink};
use crate::pipeline::CycleResult;

/// Writes the digest to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, new_jobs: &CycleResult) -> Result<()> {
        match Digest::from_cycle(new_jobs, Local::now().naive_local()) {
            Some(digest) => {
                log::info!("{}\n{}", digest.subject, digest.body);
            }
            None => log::info!("No new jobs this cycle."),
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
