//! The ingest-and-reconcile pipeline.
//!
//! - `reconcile`: classify a source's scrape against the seen state
//! - `circuit_breaker`: optional guard against collapsed scrapes
//! - `cycle`: run every source, notify once, persist once
//! - `schedule`: run cycles on an interval
//! - `stats`: counters shared with the HTTP layer
//! - `top_jobs`: keyword view over the current listing

pub mod circuit_breaker;
pub mod cycle;
pub mod reconcile;
pub mod schedule;
pub mod stats;
pub mod top_jobs;

pub use circuit_breaker::{GuardVerdict, ScrapeGuard};
pub use cycle::{
    CycleOptions, CycleReport, CycleResult, CycleRunner, CycleStatus, SourceReport, SourceStatus,
};
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use schedule::run_every;
pub use stats::{ScrapeStats, StatsSnapshot};
pub use top_jobs::{TopJob, TopJobs, top_jobs};
