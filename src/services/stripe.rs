// src/services/stripe.rs

//! Stripe jobs search page.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html};
use url::Url;

use crate::error::Result;
use crate::models::{JobRecord, SourcesConfig};
use crate::services::SourceExtractor;
use crate::services::filters::{JobCollector, TitleFilter, parse_selector};
use crate::utils::http::fetch_text;
use crate::utils::{normalize_whitespace, resolve_url};

const SOURCE: &str = "stripe";
const BASE_URL: &str = "https://stripe.com";

pub struct StripeSource {
    client: Client,
    url: String,
    filter: TitleFilter,
}

impl StripeSource {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            url: config.stripe_url.clone(),
            filter: TitleFilter::new(&config.exclude_title_keywords),
        }
    }

    /// Parse the listing table. Each posting is a `tr.TableRow`.
    fn parse_listing(&self, html: &str) -> Result<Vec<JobRecord>> {
        let base = Url::parse(BASE_URL)?;
        let document = Html::parse_document(html);
        let row_sel = parse_selector("tbody.JobsListings__tableBody tr.TableRow")?;
        let link_sel = parse_selector("a.JobsListings__link")?;
        let team_sel = parse_selector(".JobsListings__tableCell--departments li")?;
        let location_sel = parse_selector(".JobsListings__locationDisplayName")?;

        let mut collector = JobCollector::new(SOURCE);
        for row in document.select(&row_sel) {
            let Some(link_elem) = row.select(&link_sel).next() else {
                continue;
            };
            let Some(href) = link_elem.value().attr("href").filter(|h| !h.is_empty()) else {
                continue;
            };
            let link = resolve_url(&base, href);
            let title = text_of(link_elem);

            if self.filter.excludes(&title) {
                continue;
            }

            let category = row
                .select(&team_sel)
                .next()
                .map(text_of)
                .unwrap_or_else(|| "Unknown".to_string());
            let location = row
                .select(&location_sel)
                .next()
                .map(text_of)
                .unwrap_or_else(|| "Unknown".to_string());

            collector.push(
                JobRecord::new(SOURCE, title, link)
                    .with_location(location)
                    .with_category(category),
            );
        }

        Ok(collector.finish())
    }
}

fn text_of(elem: ElementRef<'_>) -> String {
    normalize_whitespace(&elem.text().collect::<String>())
}

#[async_trait]
impl SourceExtractor for StripeSource {
    fn id(&self) -> &str {
        SOURCE
    }

    async fn extract(&self) -> Result<Vec<JobRecord>> {
        log::debug!("Scraping Stripe: {}", self.url);
        let html = fetch_text(SOURCE, self.client.get(&self.url)).await?;
        let jobs = self.parse_listing(&html)?;
        log::debug!("[Stripe] job listings found: {}", jobs.len());
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <table><tbody class="JobsListings__tableBody">
          <tr class="TableRow">
            <td><a class="JobsListings__link" href="/jobs/listing/infra-engineer/1">Infrastructure Engineer</a></td>
            <td class="JobsListings__tableCell--departments"><ul><li>Infrastructure</li></ul></td>
            <td><span class="JobsListings__locationDisplayName">Seattle</span></td>
          </tr>
          <tr class="TableRow">
            <td><a class="JobsListings__link" href="/jobs/listing/infra-engineer/1">Infrastructure Engineer</a></td>
          </tr>
          <tr class="TableRow">
            <td><a class="JobsListings__link" href="https://stripe.com/jobs/listing/staff/2">Staff Engineer</a></td>
          </tr>
          <tr class="TableRow">
            <td><a class="JobsListings__link" href="/jobs/listing/new-grad/3">Software Engineer, New Grad</a></td>
          </tr>
          <tr class="TableRow"><td>no link here</td></tr>
        </tbody></table>
    "#;

    fn source() -> StripeSource {
        StripeSource::new(Client::new(), &SourcesConfig::default())
    }

    #[test]
    fn parses_rows_and_applies_rules() {
        let jobs = source().parse_listing(PAGE).unwrap();
        assert_eq!(jobs.len(), 2);

        assert_eq!(jobs[0].title, "Infrastructure Engineer");
        assert_eq!(
            jobs[0].link,
            "https://stripe.com/jobs/listing/infra-engineer/1"
        );
        assert_eq!(jobs[0].category.as_deref(), Some("Infrastructure"));
        assert_eq!(jobs[0].location.as_deref(), Some("Seattle"));

        assert_eq!(jobs[1].location.as_deref(), Some("Unknown"));
        assert!(jobs.iter().all(|j| j.source == "stripe"));
    }
}
