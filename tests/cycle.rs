mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{BrokenSource, FakeSource, RecordingSink, SlowSource, StalledSource, job, links};
use jobwatch::pipeline::{CycleOptions, CycleRunner, CycleStatus, SourceStatus};
use jobwatch::services::{SourceExtractor, SourceRegistry};
use jobwatch::storage::{LocalStorage, MemoryStorage, SeenState, SeenStore};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn registry(extractors: Vec<Box<dyn SourceExtractor>>) -> SourceRegistry {
    SourceRegistry::new(extractors).unwrap()
}

fn quick() -> CycleOptions {
    CycleOptions {
        source_timeout: Duration::from_millis(100),
        io_timeout: Duration::from_secs(5),
        guard: None,
    }
}

#[tokio::test]
async fn failing_source_does_not_affect_the_others() {
    let mut prior = SeenState::new();
    prior.replace_entry("beta", vec![job("beta", "B1", "Kept")]);
    let store = Arc::new(MemoryStorage::with_state(prior));
    let sink = RecordingSink::new();

    let runner = CycleRunner::new(
        registry(vec![
            Box::new(FakeSource::new("alpha", vec![job("alpha", "A1", "One")])),
            Box::new(BrokenSource("beta")),
            Box::new(FakeSource::new("gamma", vec![job("gamma", "G1", "Three")])),
        ]),
        store.clone(),
        sink.clone(),
    );

    let report = runner.run_cycle().await;

    assert_eq!(report.status(), CycleStatus::PartialFailure);
    assert_eq!(report.failed_sources(), vec!["beta"]);
    assert!(report.notified);
    assert!(report.persisted);

    let calls = sink.calls().await;
    assert_eq!(calls.len(), 1);
    let result = &calls[0];
    assert_eq!(
        result.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["alpha", "beta", "gamma"]
    );
    assert_eq!(links(&result["alpha"]), vec!["A1"]);
    assert!(result["beta"].is_empty());
    assert_eq!(links(&result["gamma"]), vec!["G1"]);

    assert_eq!(store.save_count(), 1);
    let saved = store.snapshot().await.unwrap();
    assert_eq!(links(saved.entry("alpha")), vec!["A1"]);
    assert_eq!(links(saved.entry("beta")), vec!["B1"]);
    assert_eq!(links(saved.entry("gamma")), vec!["G1"]);
}

#[tokio::test]
async fn second_cycle_only_alerts_on_new_postings() {
    let source = FakeSource::new("alpha", vec![job("alpha", "A1", "One")]);
    let listing = source.listing();
    let store = Arc::new(MemoryStorage::new());
    let sink = RecordingSink::new();
    let runner = CycleRunner::new(registry(vec![Box::new(source)]), store.clone(), sink.clone());

    runner.run_cycle().await;
    *listing.lock().await = vec![job("alpha", "A1", "One (Remote)"), job("alpha", "A2", "Two")];
    let report = runner.run_cycle().await;

    assert_eq!(report.total_new(), 1);
    assert_eq!(
        report.sources[0].status,
        SourceStatus::Succeeded {
            found: 2,
            new: 1,
            updated: 1,
            stale: 0
        }
    );
    let calls = sink.calls().await;
    assert_eq!(links(&calls[0]["alpha"]), vec!["A1"]);
    assert_eq!(links(&calls[1]["alpha"]), vec!["A2"]);

    let saved = store.snapshot().await.unwrap();
    assert_eq!(saved.entry("alpha")[0].title, "One (Remote)");
    assert_eq!(store.save_count(), 2);
}

#[tokio::test]
async fn stalled_source_times_out_like_a_failure() {
    let mut prior = SeenState::new();
    prior.replace_entry("slow", vec![job("slow", "S1", "Kept")]);
    let store = Arc::new(MemoryStorage::with_state(prior));
    let sink = RecordingSink::new();

    let runner = CycleRunner::new(
        registry(vec![
            Box::new(StalledSource("slow")),
            Box::new(FakeSource::new("fast", vec![job("fast", "F1", "Quick")])),
        ]),
        store.clone(),
        sink.clone(),
    )
    .with_options(quick());

    let report = runner.run_cycle().await;

    assert_eq!(report.failed_sources(), vec!["slow"]);
    assert_eq!(report.total_new(), 1);
    let saved = store.snapshot().await.unwrap();
    assert_eq!(links(saved.entry("slow")), vec!["S1"]);
}

#[tokio::test]
async fn cancelled_cycle_still_notifies_and_persists_once() {
    let store = Arc::new(MemoryStorage::new());
    let sink = RecordingSink::new();
    let runner = Arc::new(CycleRunner::new(
        registry(vec![
            Box::new(StalledSource("slow")),
            Box::new(FakeSource::new("later", vec![job("later", "L1", "Never")])),
        ]),
        store.clone(),
        sink.clone(),
    ));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let report = runner.run_cycle_with_cancel(&cancel).await;

    assert!(report.cancelled);
    assert_eq!(report.failed_sources(), vec!["slow", "later"]);
    assert_eq!(sink.calls().await.len(), 1);
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn notify_failure_does_not_block_persistence() {
    let store = Arc::new(MemoryStorage::new());
    let runner = CycleRunner::new(
        registry(vec![Box::new(FakeSource::new("alpha", vec![job("alpha", "A1", "One")]))]),
        store.clone(),
        RecordingSink::failing(),
    );

    let report = runner.run_cycle().await;

    assert!(!report.notified);
    assert!(report.persisted);
    assert_eq!(report.status(), CycleStatus::Clean);
    assert_eq!(links(store.snapshot().await.unwrap().entry("alpha")), vec!["A1"]);
}

#[tokio::test]
async fn save_failure_is_reported_after_notifying() {
    let store = Arc::new(MemoryStorage::new().failing_save());
    let sink = RecordingSink::new();
    let runner = CycleRunner::new(
        registry(vec![Box::new(FakeSource::new("alpha", vec![job("alpha", "A1", "One")]))]),
        store.clone(),
        sink.clone(),
    );

    let report = runner.run_cycle().await;

    assert!(!report.persisted);
    assert!(report.notified);
    assert_eq!(links(&sink.calls().await[0]["alpha"]), vec!["A1"]);
}

#[tokio::test]
async fn unreadable_state_starts_empty() {
    let store = Arc::new(MemoryStorage::new().failing_load());
    let sink = RecordingSink::new();
    let runner = CycleRunner::new(
        registry(vec![Box::new(FakeSource::new("alpha", vec![job("alpha", "A1", "One")]))]),
        store,
        sink.clone(),
    );

    let report = runner.run_cycle().await;

    assert_eq!(report.total_new(), 1);
    assert_eq!(report.status(), CycleStatus::Clean);
}

#[tokio::test]
async fn cycles_converge_through_a_state_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("seen.json");
    let postings = vec![job("alpha", "A1", "One"), job("alpha", "", "Broken")];

    for expected_new in [1, 0] {
        let store: Arc<dyn SeenStore> = Arc::new(LocalStorage::new(&path));
        let sink = RecordingSink::new();
        let runner = CycleRunner::new(
            registry(vec![Box::new(FakeSource::new("alpha", postings.clone()))]),
            store,
            sink.clone(),
        );

        let report = runner.run_cycle().await;
        assert_eq!(report.total_new(), expected_new);
    }

    let stored = LocalStorage::new(&path).load().await.unwrap();
    assert_eq!(links(stored.entry("alpha")), vec!["A1"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_cycles_run_one_at_a_time() {
    let source = SlowSource::new(
        "alpha",
        vec![job("alpha", "A1", "One")],
        Duration::from_millis(50),
    );
    let peak = source.peak();
    let store = Arc::new(MemoryStorage::new());
    let runner = Arc::new(CycleRunner::new(
        registry(vec![Box::new(source)]),
        store.clone(),
        RecordingSink::new(),
    ));

    let (first, second) = tokio::join!(
        {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move { runner.run_cycle().await })
        },
        {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move { runner.run_cycle().await })
        }
    );
    let mut new_counts = vec![first.unwrap().total_new(), second.unwrap().total_new()];
    new_counts.sort();

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(store.save_count(), 2);
    assert_eq!(new_counts, vec![0, 1]);
}
