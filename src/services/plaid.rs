// src/services/plaid.rs

//! Plaid careers page.

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use url::Url;

use crate::error::Result;
use crate::models::{JobRecord, SourcesConfig};
use crate::services::SourceExtractor;
use crate::services::filters::{JobCollector, TitleFilter, parse_selector};
use crate::utils::http::fetch_text;
use crate::utils::{normalize_whitespace, resolve_url};

const SOURCE: &str = "plaid";
const BASE_URL: &str = "https://plaid.com";

pub struct PlaidSource {
    client: Client,
    url: String,
    filter: TitleFilter,
}

impl PlaidSource {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            url: config.plaid_url.clone(),
            filter: TitleFilter::new(&config.exclude_title_keywords),
        }
    }

    /// Parse posting cards. Only engineering openings are kept, which Plaid
    /// encodes in the link path.
    fn parse_listing(&self, html: &str) -> Result<Vec<JobRecord>> {
        let base = Url::parse(BASE_URL)?;
        let document = Html::parse_document(html);
        let card_sel = parse_selector("div.MuiStack-root")?;
        let title_sel = parse_selector("p.css-kluxnl")?;
        let location_sel = parse_selector("p.css-kj1jcl")?;
        let link_sel = parse_selector("a[href]")?;

        let mut collector = JobCollector::new(SOURCE);
        for card in document.select(&card_sel) {
            let (Some(title_elem), Some(location_elem), Some(link_elem)) = (
                card.select(&title_sel).next(),
                card.select(&location_sel).next(),
                card.select(&link_sel).next(),
            ) else {
                continue;
            };

            let title = normalize_whitespace(&title_elem.text().collect::<String>());
            let location = normalize_whitespace(&location_elem.text().collect::<String>());
            let href = link_elem.value().attr("href").unwrap_or_default();

            if !href.to_lowercase().contains("engineering") {
                continue;
            }
            if self.filter.excludes(&title) {
                continue;
            }

            let link = resolve_url(&base, href);

            collector.push(
                JobRecord::new(SOURCE, title, link)
                    .with_location(location)
                    .with_category("Engineering"),
            );
        }

        Ok(collector.finish())
    }
}

#[async_trait]
impl SourceExtractor for PlaidSource {
    fn id(&self) -> &str {
        SOURCE
    }

    async fn extract(&self) -> Result<Vec<JobRecord>> {
        log::debug!("Scraping Plaid: {}", self.url);
        let html = fetch_text(SOURCE, self.client.get(&self.url)).await?;
        let jobs = self.parse_listing(&html)?;
        log::debug!("[Plaid] job listings found: {}", jobs.len());
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="MuiStack-root">
          <div class="MuiStack-root">
            <a href="/careers/openings/engineering/platform-engineer">
              <p class="css-kluxnl">Platform Engineer</p>
              <p class="css-kj1jcl">San Francisco</p>
            </a>
          </div>
        </div>
        <div class="MuiStack-root">
          <a href="/careers/openings/sales/account-executive">
            <p class="css-kluxnl">Account Executive</p>
            <p class="css-kj1jcl">New York</p>
          </a>
        </div>
        <div class="MuiStack-root">
          <a href="https://plaid.com/careers/openings/engineering/em">
            <p class="css-kluxnl">Engineering Manager</p>
            <p class="css-kj1jcl">Remote</p>
          </a>
        </div>
    "#;

    #[test]
    fn keeps_engineering_cards_once() {
        let source = PlaidSource::new(Client::new(), &SourcesConfig::default());
        let jobs = source.parse_listing(PAGE).unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Platform Engineer");
        assert_eq!(
            jobs[0].link,
            "https://plaid.com/careers/openings/engineering/platform-engineer"
        );
        assert_eq!(jobs[0].location.as_deref(), Some("San Francisco"));
        assert_eq!(jobs[0].category.as_deref(), Some("Engineering"));
    }
}
