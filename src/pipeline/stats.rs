//! Scrape statistics shared between the cycle runner and the HTTP layer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use super::cycle::CycleReport;

#[derive(Debug, Default)]
struct StatsInner {
    total_cycles: u64,
    total_duration: Duration,
    last_cycle_at: Option<DateTime<Utc>>,
    last_report: Option<CycleReport>,
}

/// Counters written once per cycle by the runner.
#[derive(Debug, Default)]
pub struct ScrapeStats {
    inner: RwLock<StatsInner>,
}

/// Point-in-time copy of [`ScrapeStats`].
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_cycles: u64,
    pub total_duration_secs: f64,
    pub average_duration_secs: f64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_report: Option<CycleReport>,
}

impl ScrapeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, report: &CycleReport, elapsed: Duration) {
        let mut inner = self.inner.write().await;
        inner.total_cycles += 1;
        inner.total_duration += elapsed;
        inner.last_cycle_at = Some(report.finished_at);
        inner.last_report = Some(report.clone());
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.read().await;
        let total = inner.total_duration.as_secs_f64();
        let average = if inner.total_cycles == 0 {
            0.0
        } else {
            total / inner.total_cycles as f64
        };
        StatsSnapshot {
            total_cycles: inner.total_cycles,
            total_duration_secs: total,
            average_duration_secs: average,
            last_cycle_at: inner.last_cycle_at,
            last_report: inner.last_report.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn averages_over_recorded_cycles() {
        let stats = ScrapeStats::new();
        assert_eq!(stats.snapshot().await.average_duration_secs, 0.0);

        let report = CycleReport::empty(Utc::now());
        stats.record(&report, Duration::from_secs(2)).await;
        stats.record(&report, Duration::from_secs(4)).await;

        let snapshot = stats.snapshot().await;
        assert_eq!(snapshot.total_cycles, 2);
        assert_eq!(snapshot.average_duration_secs, 3.0);
        assert_eq!(snapshot.last_cycle_at, Some(report.finished_at));
    }
}
