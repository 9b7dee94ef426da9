//! In-process interval scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::cycle::CycleRunner;

/// Run a cycle every `interval` until `shutdown` fires.
///
/// The first cycle starts immediately. A cycle already in flight when
/// shutdown arrives is cancelled at source granularity and still persists.
pub async fn run_every(runner: Arc<CycleRunner>, interval: Duration, shutdown: CancellationToken) {
    log::info!(
        "Scheduler active: one cycle every {}s",
        interval.as_secs()
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let report = runner.run_cycle_with_cancel(&shutdown).await;
                log::debug!(
                    "Scheduled cycle finished: {:?}, {} new",
                    report.status(),
                    report.total_new()
                );
            }
        }
    }

    log::info!("Scheduler stopped");
}
