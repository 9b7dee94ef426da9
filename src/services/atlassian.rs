// src/services/atlassian.rs

//! Atlassian careers listings endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::Result;
use crate::models::{JobRecord, SourcesConfig};
use crate::services::SourceExtractor;
use crate::services::filters::{JobCollector, TitleFilter};
use crate::utils::http::fetch_json;

const SOURCE: &str = "atlassian";

const INCLUDE_CATEGORIES: &[&str] = &["engineering", "interns", "graduates"];

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Listing {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    locations: Option<Vec<String>>,
    #[serde(default)]
    portal_job_post: Option<PortalJobPost>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PortalJobPost {
    #[serde(default)]
    portal_url: Option<String>,
}

pub struct AtlassianSource {
    client: Client,
    url: String,
    filter: TitleFilter,
}

impl AtlassianSource {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            url: config.atlassian_url.clone(),
            filter: TitleFilter::new(&config.exclude_title_keywords),
        }
    }

    /// Keep US engineering, intern and graduate roles.
    fn collect(&self, listings: Vec<Listing>) -> Vec<JobRecord> {
        let mut collector = JobCollector::new(SOURCE);

        for listing in listings {
            let title = listing.title.as_deref().unwrap_or_default().trim();
            let category = listing.category.as_deref().unwrap_or_default().trim();
            let locations = listing.locations.unwrap_or_default();

            if title.contains("Canada") {
                continue;
            }
            if title.is_empty() || locations.is_empty() {
                continue;
            }
            if !INCLUDE_CATEGORIES.contains(&category.to_lowercase().as_str()) {
                continue;
            }
            if !locations
                .iter()
                .any(|l| l.to_lowercase().contains("united states"))
            {
                continue;
            }
            if self.filter.excludes(title) {
                continue;
            }

            let Some(link) = listing
                .portal_job_post
                .and_then(|p| p.portal_url)
                .filter(|l| !l.is_empty())
            else {
                log::warn!(
                    "[Atlassian] Skipping job with no apply link: {} | locations={:?}",
                    title,
                    locations
                );
                continue;
            };

            collector.push(
                JobRecord::new(SOURCE, title, link)
                    .with_category(category)
                    .with_location(locations.join("; "))
                    .with_extra("locations", locations),
            );
        }

        collector.finish()
    }
}

#[async_trait]
impl SourceExtractor for AtlassianSource {
    fn id(&self) -> &str {
        SOURCE
    }

    async fn extract(&self) -> Result<Vec<JobRecord>> {
        log::info!("Scraping Atlassian API: {}", self.url);
        let request = self
            .client
            .get(&self.url)
            .header("Referer", "https://www.atlassian.com/company/careers/all-jobs");
        let listings: Vec<Listing> = fetch_json(SOURCE, request).await?;
        let jobs = self.collect(listings);
        log::info!("[Atlassian] Engineering jobs in US/Remote found: {}", jobs.len());
        Ok(jobs)
    }
}
