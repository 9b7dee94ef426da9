//! Reconciliation of a fresh scrape against the seen state.
//!
//! Records are matched by `link` within one source:
//! - in the scrape only: **new**, returned for alerting
//! - in both: stored copy replaced by the scraped one; counted as updated
//!   when any field differs, never alerted
//! - in the seen state only: **stale**, dropped and logged
//!
//! The rebuilt entry mirrors the scrape exactly. An empty scrape therefore
//! clears the entry; see [`super::circuit_breaker`] for the opt-in guard.

use indexmap::IndexMap;
use serde::Serialize;

use crate::models::JobRecord;
use crate::storage::SeenState;

/// Classification of one source's scrape.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileOutcome {
    pub source: String,
    /// Records whose link was not known before, in scrape order
    pub new: Vec<JobRecord>,
    /// Known records whose content changed
    pub updated: Vec<JobRecord>,
    /// Known records that came back identical
    pub unchanged: usize,
    /// Links that disappeared from the listing
    pub stale: Vec<String>,
    /// Scraped records dropped for lacking a link
    pub untrackable: usize,
}

impl ReconcileOutcome {
    /// Whether the stored entry changed.
    pub fn has_changes(&self) -> bool {
        !self.new.is_empty() || !self.updated.is_empty() || !self.stale.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.new.len() + self.updated.len() + self.stale.len()
    }

    /// Number of records in the rebuilt entry.
    pub fn found(&self) -> usize {
        self.new.len() + self.updated.len() + self.unchanged
    }
}

/// Applies fresh scrapes to the seen state, one source at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Self
    }

    /// Reconcile `fresh` against the entry for `source` and replace that entry.
    ///
    /// Only the entry for `source` is read or written. `fresh` is not modified.
    pub fn reconcile(
        &self,
        source: &str,
        fresh: &[JobRecord],
        state: &mut SeenState,
    ) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome {
            source: source.to_string(),
            ..ReconcileOutcome::default()
        };

        // Later duplicates overwrite the value but keep the first position.
        let mut current: IndexMap<&str, &JobRecord> = IndexMap::with_capacity(fresh.len());
        for job in fresh {
            if !job.is_trackable() {
                outcome.untrackable += 1;
                continue;
            }
            current.insert(job.link.as_str(), job);
        }

        let previous: IndexMap<&str, &JobRecord> = state
            .entry(source)
            .iter()
            .map(|job| (job.link.as_str(), job))
            .collect();

        for (link, job) in &current {
            match previous.get(link) {
                None => outcome.new.push((*job).clone()),
                Some(known) if *known != *job => outcome.updated.push((*job).clone()),
                Some(_) => outcome.unchanged += 1,
            }
        }

        outcome.stale = previous
            .keys()
            .filter(|link| !current.contains_key(*link))
            .map(|link| link.to_string())
            .collect();

        let rebuilt: Vec<JobRecord> = current.into_values().cloned().collect();
        drop(previous);

        if outcome.untrackable > 0 {
            log::warn!(
                "[{}] ignored {} scraped records without a link",
                source,
                outcome.untrackable
            );
        }
        for job in &outcome.updated {
            log::info!("[{}] updated: {} ({})", source, job.title, job.link);
        }
        for link in &outcome.stale {
            log::info!("[{}] no longer listed: {}", source, link);
        }
        log::debug!(
            "[{}] reconciled: {} new, {} updated, {} unchanged, {} stale",
            source,
            outcome.new.len(),
            outcome.updated.len(),
            outcome.unchanged,
            outcome.stale.len()
        );

        state.replace_entry(source, rebuilt);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(link: &str, title: &str) -> JobRecord {
        JobRecord::new("stripe", title, link)
    }

    fn links(jobs: &[JobRecord]) -> Vec<&str> {
        jobs.iter().map(|j| j.link.as_str()).collect()
    }

    #[test]
    fn first_run_classifies_everything_new() {
        let mut state = SeenState::new();
        let fresh = vec![job("A", "X"), job("B", "Y")];

        let outcome = Reconciler::new().reconcile("stripe", &fresh, &mut state);

        assert_eq!(outcome.new, fresh);
        assert_eq!(state.entry("stripe"), fresh.as_slice());
        assert!(outcome.has_changes());
    }

    #[test]
    fn second_identical_run_finds_nothing_new() {
        let mut state = SeenState::new();
        let fresh = vec![job("A", "X"), job("B", "Y")];
        let reconciler = Reconciler::new();

        reconciler.reconcile("stripe", &fresh, &mut state);
        let outcome = reconciler.reconcile("stripe", &fresh, &mut state);

        assert!(outcome.new.is_empty());
        assert_eq!(outcome.unchanged, 2);
        assert!(!outcome.has_changes());
    }

    #[test]
    fn changed_content_updates_without_alert() {
        let mut state = SeenState::new();
        state.replace_entry("stripe", vec![job("A", "X")]);

        let outcome = Reconciler::new().reconcile("stripe", &[job("A", "X2")], &mut state);

        assert!(outcome.new.is_empty());
        assert_eq!(outcome.updated.len(), 1);
        assert_eq!(state.entry("stripe")[0].title, "X2");
    }

    #[test]
    fn vanished_links_are_stale() {
        let mut state = SeenState::new();
        state.replace_entry("stripe", vec![job("A", "X"), job("B", "Y")]);

        let outcome = Reconciler::new().reconcile("stripe", &[job("A", "X")], &mut state);

        assert!(outcome.new.is_empty());
        assert_eq!(outcome.stale, vec!["B".to_string()]);
        assert_eq!(links(state.entry("stripe")), vec!["A"]);
        assert_eq!(outcome.change_count(), 1);
    }

    #[test]
    fn duplicate_links_last_value_wins_in_first_position() {
        let mut state = SeenState::new();
        let fresh = vec![job("A", "first"), job("B", "Y"), job("A", "second")];

        let outcome = Reconciler::new().reconcile("stripe", &fresh, &mut state);

        assert_eq!(links(&outcome.new), vec!["A", "B"]);
        assert_eq!(outcome.new[0].title, "second");
        assert_eq!(state.entry("stripe").len(), 2);
    }

    #[test]
    fn empty_links_are_dropped() {
        let mut state = SeenState::new();
        let fresh = vec![job("", "No link"), job("  ", "Blank"), job("A", "X")];

        let outcome = Reconciler::new().reconcile("stripe", &fresh, &mut state);

        assert_eq!(links(&outcome.new), vec!["A"]);
        assert_eq!(outcome.untrackable, 2);
        assert_eq!(links(state.entry("stripe")), vec!["A"]);
    }

    #[test]
    fn empty_scrape_clears_the_entry() {
        let mut state = SeenState::new();
        state.replace_entry("stripe", vec![job("A", "X")]);

        let outcome = Reconciler::new().reconcile("stripe", &[], &mut state);

        assert_eq!(outcome.stale.len(), 1);
        assert!(state.contains("stripe"));
        assert!(state.entry("stripe").is_empty());
    }

    #[test]
    fn other_sources_are_untouched() {
        let mut state = SeenState::new();
        state.replace_entry("plaid", vec![JobRecord::new("plaid", "P", "P1")]);

        Reconciler::new().reconcile("stripe", &[job("A", "X")], &mut state);

        assert_eq!(links(state.entry("plaid")), vec!["P1"]);
        assert_eq!(state.source_count(), 2);
    }

    #[test]
    fn fresh_input_is_not_modified() {
        let mut state = SeenState::new();
        let fresh = vec![job("A", "X"), job("", "Y")];
        let before = fresh.clone();

        Reconciler::new().reconcile("stripe", &fresh, &mut state);

        assert_eq!(fresh, before);
    }

    #[test]
    fn duplicate_stored_links_are_reported_stale_once() {
        let mut state = SeenState::new();
        state.replace_entry(
            "stripe",
            vec![job("A", "X"), job("B", "Y"), job("A", "X"), job("C", "Z")],
        );

        let outcome = Reconciler::new().reconcile("stripe", &[job("C", "Z")], &mut state);

        assert_eq!(outcome.stale, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(links(state.entry("stripe")), vec!["C"]);
    }
}
