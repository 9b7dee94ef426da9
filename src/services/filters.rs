// src/services/filters.rs

//! Inclusion rules and output hygiene shared by the source extractors.

use std::collections::HashSet;

use scraper::Selector;

use crate::error::{AppError, Result};
use crate::models::JobRecord;

/// Case-insensitive title keyword exclusion.
#[derive(Debug, Clone, Default)]
pub struct TitleFilter {
    keywords: Vec<String>,
}

impl TitleFilter {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Whether the title contains any excluded keyword.
    pub fn excludes(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.keywords.iter().any(|k| title.contains(k.as_str()))
    }
}

/// Whether `haystack` contains any of `needles`, ignoring case.
///
/// Needles are expected in lower case.
pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles.iter().any(|n| haystack.contains(n))
}

/// Accumulates an extractor's output.
///
/// Stamps the source id, drops records without link or title, and keeps the
/// first record seen for each link.
#[derive(Debug)]
pub struct JobCollector {
    source: String,
    seen: HashSet<String>,
    jobs: Vec<JobRecord>,
    dropped: usize,
}

impl JobCollector {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            seen: HashSet::new(),
            jobs: Vec::new(),
            dropped: 0,
        }
    }

    /// Add a candidate; returns whether it was kept.
    pub fn push(&mut self, mut job: JobRecord) -> bool {
        job.source = self.source.clone();
        job.link = job.link.trim().to_string();
        job.title = job.title.trim().to_string();

        if !job.is_valid() {
            self.dropped += 1;
            return false;
        }
        if !self.seen.insert(job.link.clone()) {
            return false;
        }
        self.jobs.push(job);
        true
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn finish(self) -> Vec<JobRecord> {
        if self.dropped > 0 {
            log::debug!(
                "[{}] dropped {} candidates without link or title",
                self.source,
                self.dropped
            );
        }
        self.jobs
    }
}

/// Parse a CSS selector.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_filter_is_case_insensitive() {
        let filter = TitleFilter::new(&["Senior".to_string(), "Manager".to_string()]);
        assert!(filter.excludes("senior Software Engineer"));
        assert!(filter.excludes("Engineering MANAGER"));
        assert!(!filter.excludes("Software Engineer"));
    }

    #[test]
    fn empty_keywords_exclude_nothing() {
        let filter = TitleFilter::new(&["  ".to_string()]);
        assert!(!filter.excludes("Anything"));
    }

    #[test]
    fn contains_any_matches_substrings() {
        assert!(contains_any("Denver, CO", &["denver", "austin"]));
        assert!(!contains_any("Dublin, Ireland", &["denver", "austin"]));
    }

    #[test]
    fn collector_drops_invalid_and_duplicates() {
        let mut collector = JobCollector::new("stripe");
        assert!(collector.push(JobRecord::new("", "Engineer", "https://a")));
        assert!(!collector.push(JobRecord::new("", "Engineer again", "https://a")));
        assert!(!collector.push(JobRecord::new("", "No link", "")));
        assert!(!collector.push(JobRecord::new("", "  ", "https://b")));

        let jobs = collector.finish();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].source, "stripe");
        assert_eq!(jobs[0].title, "Engineer");
    }

    #[test]
    fn test_parse_selector() {
        assert!(parse_selector("tr.TableRow").is_ok());
        assert!(parse_selector("[[invalid").is_err());
    }
}
