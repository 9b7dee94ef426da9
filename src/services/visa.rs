// src/services/visa.rs

//! Visa careers search API (paged POST).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{JobRecord, SourcesConfig};
use crate::services::SourceExtractor;
use crate::services::filters::{JobCollector, TitleFilter};
use crate::utils::http::fetch_json;

const SOURCE: &str = "visa";
const PAGE_SIZE: usize = 1000;
/// Upper bound on pages fetched in one extraction
const MAX_PAGES: usize = 50;

const EXCLUDE_DEPARTMENTS: &[&str] = &[
    "Risk",
    "Finance/Accounting",
    "Administrative",
    "Sales",
    "Customer Service",
    "Client Services",
    "Risk & Security",
    "Legal & Compliance",
    "Client Consulting",
    "Strategy & Planning",
    "Marketing & Communications",
    "Business Development",
    "Data Science/Data Engineering",
    "Human Resources",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    page: usize,
    page_size: usize,
    q: &'a str,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    job_details: Vec<VisaJob>,
    #[serde(default)]
    records_matched: usize,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct VisaJob {
    job_title: Option<String>,
    apply_url: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    department: Option<String>,
    created_on: Option<String>,
}

pub struct VisaSource {
    client: Client,
    url: String,
    filter: TitleFilter,
}

impl VisaSource {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            url: config.visa_url.clone(),
            filter: TitleFilter::new(&config.exclude_title_keywords),
        }
    }

    async fn fetch_page(&self, page: usize) -> Result<SearchPage> {
        let request = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(&SearchRequest {
                page,
                page_size: PAGE_SIZE,
                q: "",
            });
        fetch_json(SOURCE, request).await
    }

    /// Add one page of results; US only, excluded departments skipped.
    fn collect_page(&self, page: &SearchPage, collector: &mut JobCollector) {
        for job in &page.job_details {
            let title = job.job_title.as_deref().unwrap_or_default().trim();
            let apply_url = job.apply_url.as_deref().unwrap_or_default();
            if title.is_empty() || apply_url.is_empty() {
                continue;
            }
            let country = job.country.as_deref().unwrap_or_default();
            if !country.contains("United States") {
                continue;
            }
            if self.filter.excludes(title) {
                continue;
            }
            let department = job.department.as_deref().unwrap_or_default();
            if EXCLUDE_DEPARTMENTS.iter().any(|d| department.contains(d)) {
                continue;
            }

            let location = format!(
                "{}, {}, {}",
                job.city.as_deref().unwrap_or_default(),
                job.region.as_deref().unwrap_or_default(),
                country
            );
            let mut record = JobRecord::new(SOURCE, title, apply_url)
                .with_location(location)
                .with_category(department);
            if let Some(posted) = job.created_on.as_deref().filter(|p| !p.is_empty()) {
                record = record.with_extra("posted", posted);
            }
            collector.push(record);
        }
    }
}

#[async_trait]
impl SourceExtractor for VisaSource {
    fn id(&self) -> &str {
        SOURCE
    }

    async fn extract(&self) -> Result<Vec<JobRecord>> {
        log::debug!("Scraping Visa jobs from API");
        let mut collector = JobCollector::new(SOURCE);

        for page_number in 1..=MAX_PAGES {
            let page = self.fetch_page(page_number).await?;
            if page.job_details.is_empty() {
                break;
            }
            log::debug!(
                "[Visa] Page {}: Retrieved {} jobs",
                page_number,
                page.job_details.len()
            );
            self.collect_page(&page, &mut collector);

            if page_number * PAGE_SIZE >= page.records_matched {
                break;
            }
        }

        log::debug!("[Visa] Total jobs stored: {}", collector.len());
        Ok(collector.finish())
    }
}
