// src/services/databricks.rs

//! Databricks, via the Greenhouse department data behind the careers page.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::Result;
use crate::models::{JobRecord, SourcesConfig};
use crate::services::SourceExtractor;
use crate::services::filters::{JobCollector, TitleFilter, contains_any};
use crate::services::greenhouse::GreenhouseDepartment;
use crate::utils::http::fetch_json;

const SOURCE: &str = "databricks";

const EXCLUDE_DEPARTMENTS: &[&str] = &[
    "Business Development",
    "Customer Success",
    "People and HR",
    "Product",
    "Professional Services",
    "Recruiting",
    "Research",
    "Sales",
    "Exec Sales Enablement",
    "Sales Development",
    "Legal",
    "Administration",
    "Go To Market",
];

const INCLUDE_CITIES: &[&str] = &[
    "san francisco",
    "mountain view",
    "boston",
    "bellevue",
    "new york city",
    "new york",
    "seattle",
    "northeast - united states",
    "westcoast - united states",
    "central - united states",
    "united states",
    "remote",
];

#[derive(Debug, Deserialize, Default)]
struct PagePayload {
    #[serde(default)]
    result: PageResult,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PageResult {
    #[serde(default)]
    page_context: PageContext,
}

#[derive(Debug, Deserialize, Default)]
struct PageContext {
    #[serde(default)]
    data: PageData,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PageData {
    #[serde(default)]
    all_greenhouse_department: DepartmentNodes,
}

#[derive(Debug, Deserialize, Default)]
struct DepartmentNodes {
    #[serde(default)]
    nodes: Vec<GreenhouseDepartment>,
}

pub struct DatabricksSource {
    client: Client,
    url: String,
    filter: TitleFilter,
}

impl DatabricksSource {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            url: config.databricks_url.clone(),
            filter: TitleFilter::new(&config.exclude_title_keywords),
        }
    }

    fn collect(&self, payload: PagePayload) -> Vec<JobRecord> {
        let departments = payload
            .result
            .page_context
            .data
            .all_greenhouse_department
            .nodes;
        let mut collector = JobCollector::new(SOURCE);

        for department in &departments {
            let department_name = department.name.as_deref().unwrap_or_default();
            if EXCLUDE_DEPARTMENTS.contains(&department_name) {
                continue;
            }

            for job in &department.jobs {
                let (title, link) = (job.title(), job.link());
                if title.is_empty() || link.is_empty() {
                    continue;
                }
                if !contains_any(job.location_name(), INCLUDE_CITIES) {
                    continue;
                }
                if self.filter.excludes(title) {
                    continue;
                }

                collector.push(
                    JobRecord::new(SOURCE, title, link)
                        .with_location(job.location_name())
                        .with_category(department_name),
                );
            }
        }

        collector.finish()
    }
}

#[async_trait]
impl SourceExtractor for DatabricksSource {
    fn id(&self) -> &str {
        SOURCE
    }

    async fn extract(&self) -> Result<Vec<JobRecord>> {
        log::debug!("Scraping Databricks (Greenhouse page data): {}", self.url);
        let request = self
            .client
            .get(&self.url)
            .header("Origin", "https://www.databricks.com")
            .header(
                "Referer",
                "https://www.databricks.com/company/careers/open-positions",
            )
            .header("Accept", "*/*");
        let payload: PagePayload = fetch_json(SOURCE, request).await?;
        let jobs = self.collect(payload);
        log::debug!("[Databricks] job listings found: {}", jobs.len());
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"result": {"pageContext": {"data": {"allGreenhouseDepartment": {"nodes": [
        {"name": "Engineering", "jobs": [
            {"title": "Software Engineer - Delta", "absolute_url": "https://db.co/1",
             "location": {"name": "Mountain View, California"}},
            {"title": "Software Engineer - Photon", "absolute_url": "https://db.co/2",
             "location": {"name": "Amsterdam, Netherlands"}}
        ]},
        {"name": "Sales", "jobs": [
            {"title": "Solutions Engineer", "absolute_url": "https://db.co/3",
             "location": {"name": "Seattle, Washington"}}
        ]}
    ]}}}}}"#;

    #[test]
    fn applies_department_and_city_rules() {
        let source = DatabricksSource::new(Client::new(), &SourcesConfig::default());
        let payload: PagePayload = serde_json::from_str(PAYLOAD).unwrap();
        let jobs = source.collect(payload);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].link, "https://db.co/1");
        assert_eq!(jobs[0].category.as_deref(), Some("Engineering"));
    }

    #[test]
    fn missing_structure_yields_nothing() {
        let source = DatabricksSource::new(Client::new(), &SourcesConfig::default());
        let payload: PagePayload = serde_json::from_str(r#"{"result": {}}"#).unwrap();
        assert!(source.collect(payload).is_empty());
    }
}
