// src/services/datadog.rs

//! Datadog, via the public Greenhouse jobs board.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::Result;
use crate::models::{JobRecord, SourcesConfig};
use crate::services::SourceExtractor;
use crate::services::filters::{JobCollector, TitleFilter, contains_any};
use crate::services::greenhouse::GreenhouseJob;
use crate::utils::http::fetch_json;

const SOURCE: &str = "datadog";

const US_MARKERS: &[&str] = &["usa", "united states"];
const EARLY_CAREER_TYPES: &[&str] = &["internship", "early career"];

#[derive(Debug, Deserialize, Default)]
struct JobsPayload {
    #[serde(default)]
    jobs: Vec<GreenhouseJob>,
}

pub struct DatadogSource {
    client: Client,
    url: String,
    filter: TitleFilter,
}

impl DatadogSource {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            url: config.datadog_url.clone(),
            filter: TitleFilter::new(&config.exclude_title_keywords),
        }
    }

    /// Keep US engineering, early career and professional services roles.
    fn collect(&self, payload: JobsPayload) -> Vec<JobRecord> {
        let mut collector = JobCollector::new(SOURCE);

        for job in &payload.jobs {
            let area = job.metadata_value("Area - Engineering");
            let early_career = job.metadata_value("Early Career Time Type");
            let cost_center = job.metadata_value("Cost Center");

            let relevant = area.to_lowercase().contains("engineering")
                || EARLY_CAREER_TYPES.contains(&early_career.to_lowercase().as_str())
                || cost_center.to_lowercase().contains("professional services");
            if !relevant {
                continue;
            }
            if !contains_any(job.location_name(), US_MARKERS) {
                continue;
            }

            let (title, link) = (job.title(), job.link());
            if title.is_empty() || link.is_empty() {
                continue;
            }
            if self.filter.excludes(title) {
                continue;
            }

            let category = [area, cost_center]
                .into_iter()
                .find(|c| !c.is_empty())
                .unwrap_or_else(|| "Engineering".to_string());

            collector.push(
                JobRecord::new(SOURCE, title, link)
                    .with_location(job.location_name())
                    .with_category(category),
            );
        }

        collector.finish()
    }
}

#[async_trait]
impl SourceExtractor for DatadogSource {
    fn id(&self) -> &str {
        SOURCE
    }

    async fn extract(&self) -> Result<Vec<JobRecord>> {
        log::debug!("Scraping Datadog careers API: {}", self.url);
        let payload: JobsPayload = fetch_json(SOURCE, self.client.get(&self.url)).await?;
        let jobs = self.collect(payload);
        log::debug!(
            "[Datadog] US Engineering / Early Career / Professional Services jobs found: {}",
            jobs.len()
        );
        Ok(jobs)
    }
}
