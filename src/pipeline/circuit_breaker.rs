//! Guard against scrapes that silently collapse.
//!
//! A source that returns far fewer jobs than it did last time, without an
//! error, is more often broken markup or an upstream outage than a real
//! listing wipe. When enabled, such a scrape is treated as an extraction
//! failure so the stored entry survives until the next cycle.

use crate::error::{AppError, Result};
use crate::models::ReconcileConfig;

/// Thresholds for the scrape guard.
#[derive(Debug, Clone, Copy)]
pub struct ScrapeGuard {
    /// Maximum allowed drop percentage (0-100)
    max_drop_percent: u8,
    /// Below this many known jobs only an empty scrape is rejected
    min_baseline: usize,
}

/// Verdict for one source's scrape.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardVerdict {
    /// Count is in line with the previous entry
    Safe { current: usize, previous: usize },
    /// No meaningful history to compare against
    ColdStart { current: usize },
    /// Count dropped by more than the threshold
    Triggered {
        current: usize,
        previous: usize,
        drop_percent: f64,
    },
    /// Known jobs, but nothing came back
    EmptyResult { previous: usize },
}

impl ScrapeGuard {
    pub fn new(max_drop_percent: u8, min_baseline: usize) -> Self {
        Self {
            max_drop_percent: max_drop_percent.min(100),
            min_baseline,
        }
    }

    /// The configured guard, or `None` when it is switched off.
    pub fn from_config(config: &ReconcileConfig) -> Option<Self> {
        config
            .guard_empty_scrape
            .then(|| Self::new(config.max_drop_percent, config.min_baseline))
    }

    pub fn check(&self, current: usize, previous: usize) -> GuardVerdict {
        if current == 0 {
            if previous == 0 {
                return GuardVerdict::ColdStart { current };
            }
            return GuardVerdict::EmptyResult { previous };
        }

        if previous < self.min_baseline {
            return GuardVerdict::ColdStart { current };
        }

        if current < previous {
            let drop_percent = (previous - current) as f64 / previous as f64 * 100.0;
            if drop_percent > f64::from(self.max_drop_percent) {
                return GuardVerdict::Triggered {
                    current,
                    previous,
                    drop_percent,
                };
            }
        }

        GuardVerdict::Safe { current, previous }
    }

    /// Ok when the scrape may be reconciled, `SuspiciousScrape` otherwise.
    pub fn validate(&self, source: &str, current: usize, previous: usize) -> Result<()> {
        match self.check(current, previous) {
            GuardVerdict::Safe { .. } | GuardVerdict::ColdStart { .. } => Ok(()),
            GuardVerdict::Triggered { drop_percent, .. } => {
                log::error!(
                    "[{}] scrape guard triggered: {} -> {} jobs ({:.1}% drop > {}%)",
                    source,
                    previous,
                    current,
                    drop_percent,
                    self.max_drop_percent
                );
                Err(AppError::SuspiciousScrape {
                    source_id: source.to_string(),
                    current,
                    previous,
                })
            }
            GuardVerdict::EmptyResult { previous } => {
                log::error!(
                    "[{}] scrape guard: empty result, {} jobs previously known",
                    source,
                    previous
                );
                Err(AppError::SuspiciousScrape {
                    source_id: source.to_string(),
                    current: 0,
                    previous,
                })
            }
        }
    }
}
