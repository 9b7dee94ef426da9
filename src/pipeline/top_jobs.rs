//! Keyword-filtered view over the current listing.

use serde::Serialize;

use crate::storage::SeenState;
use crate::utils::capitalize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopJob {
    pub company: String,
    pub title: String,
    pub location: Option<String>,
    pub link: String,
    pub logo: String,
    /// Keywords that matched this job
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopJobs {
    pub count: usize,
    pub jobs: Vec<TopJob>,
    pub keywords: Vec<String>,
}

/// Jobs whose title or description mentions any of `keywords`.
///
/// Matching is case-insensitive. Results are sorted by company, then title.
pub fn top_jobs(state: &SeenState, keywords: &[String]) -> TopJobs {
    let needles: Vec<(String, &String)> = keywords
        .iter()
        .map(|k| (k.to_lowercase(), k))
        .filter(|(k, _)| !k.is_empty())
        .collect();

    let mut jobs: Vec<TopJob> = state
        .iter()
        .flat_map(|(source, records)| records.iter().map(move |job| (source, job)))
        .filter_map(|(source, job)| {
            let text = job.text_for_matching();
            let filters: Vec<String> = needles
                .iter()
                .filter(|(needle, _)| text.contains(needle.as_str()))
                .map(|(_, keyword)| (*keyword).clone())
                .collect();
            if filters.is_empty() {
                return None;
            }

            let logo = job.logo().map(str::to_string).unwrap_or_else(|| {
                format!("/logos/{}.svg", source.to_lowercase().replace(' ', "-"))
            });
            Some(TopJob {
                company: capitalize(source),
                title: job.title.clone(),
                location: job.location.clone(),
                link: job.link.clone(),
                logo,
                filters,
            })
        })
        .collect();

    jobs.sort_by_cached_key(|j| (j.company.to_lowercase(), j.title.to_lowercase()));

    TopJobs {
        count: jobs.len(),
        jobs,
        keywords: keywords.to_vec(),
    }
}
