// src/services/digitalocean.rs

//! DigitalOcean, via the Greenhouse embed departments API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::Result;
use crate::models::{JobRecord, SourcesConfig};
use crate::services::SourceExtractor;
use crate::services::filters::{JobCollector, TitleFilter, contains_any};
use crate::services::greenhouse::GreenhouseDepartment;
use crate::utils::http::fetch_json;

const SOURCE: &str = "digitalocean";

const INCLUDE_CITIES: &[&str] = &["denver", "seattle", "boston", "austin"];
const INCLUDE_GROUPINGS: &[&str] = &["AI, Engineering & Technology", "Security"];

#[derive(Debug, Deserialize, Default)]
struct DepartmentsPayload {
    #[serde(default)]
    departments: Vec<GreenhouseDepartment>,
}

pub struct DigitalOceanSource {
    client: Client,
    url: String,
    filter: TitleFilter,
}

impl DigitalOceanSource {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            url: config.digitalocean_url.clone(),
            filter: TitleFilter::new(&config.exclude_title_keywords),
        }
    }

    fn collect(&self, payload: DepartmentsPayload) -> Vec<JobRecord> {
        let mut collector = JobCollector::new(SOURCE);

        for job in payload.departments.iter().flat_map(|d| d.jobs.iter()) {
            let (title, link) = (job.title(), job.link());
            if title.is_empty() || link.is_empty() {
                continue;
            }
            if !contains_any(job.location_name(), INCLUDE_CITIES) {
                continue;
            }

            let grouping = job.metadata_value("Career Page Grouping");
            if !INCLUDE_GROUPINGS.iter().any(|g| grouping.contains(g)) {
                continue;
            }
            if self.filter.excludes(title) {
                continue;
            }

            collector.push(
                JobRecord::new(SOURCE, title, link)
                    .with_location(job.location_name())
                    .with_category(grouping),
            );
        }

        collector.finish()
    }
}

#[async_trait]
impl SourceExtractor for DigitalOceanSource {
    fn id(&self) -> &str {
        SOURCE
    }

    async fn extract(&self) -> Result<Vec<JobRecord>> {
        log::debug!("Scraping DigitalOcean (Greenhouse embed API): {}", self.url);
        let request = self
            .client
            .get(&self.url)
            .header("Origin", "https://www.digitalocean.com")
            .header(
                "Referer",
                "https://www.digitalocean.com/careers/open-roles?location=Denver",
            )
            .header("Accept", "*/*");
        let payload: DepartmentsPayload = fetch_json(SOURCE, request).await?;
        let jobs = self.collect(payload);
        log::debug!("[DigitalOcean] job listings found: {}", jobs.len());
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "departments": [
            {"name": "Engineering", "jobs": [
                {"title": "Site Reliability Engineer", "absolute_url": "https://do.co/jobs/1",
                 "location": {"name": "Denver, CO"},
                 "metadata": [{"name": "Career Page Grouping", "value": "AI, Engineering & Technology"}]},
                {"title": "Security Engineer", "absolute_url": "https://do.co/jobs/2",
                 "location": {"name": "New York, NY"},
                 "metadata": [{"name": "Career Page Grouping", "value": "Security"}]},
                {"title": "Support Engineer", "absolute_url": "https://do.co/jobs/3",
                 "location": {"name": "Austin, TX"},
                 "metadata": [{"name": "Career Page Grouping", "value": "Customer Support"}]},
                {"title": "Senior Platform Engineer", "absolute_url": "https://do.co/jobs/4",
                 "location": {"name": "Boston, MA"},
                 "metadata": [{"name": "Career Page Grouping", "value": "Security"}]}
            ]},
            {"name": "Duplicates", "jobs": [
                {"title": "Site Reliability Engineer", "absolute_url": "https://do.co/jobs/1",
                 "location": {"name": "Denver, CO"},
                 "metadata": [{"name": "Career Page Grouping", "value": "AI, Engineering & Technology"}]}
            ]}
        ]
    }"#;

    #[test]
    fn applies_city_grouping_and_title_rules() {
        let source = DigitalOceanSource::new(Client::new(), &SourcesConfig::default());
        let payload: DepartmentsPayload = serde_json::from_str(PAYLOAD).unwrap();
        let jobs = source.collect(payload);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].link, "https://do.co/jobs/1");
        assert_eq!(jobs[0].location.as_deref(), Some("Denver, CO"));
        assert_eq!(
            jobs[0].category.as_deref(),
            Some("AI, Engineering & Technology")
        );
    }
}
