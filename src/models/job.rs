//! Job posting data structure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One job posting as seen on a source at a point in time.
///
/// `link` is the natural key within a source. Fields the pipeline does not
/// interpret (posting date, description, raw location lists) travel in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    /// Identifier of the originating source
    #[serde(rename = "site", alias = "source", default)]
    pub source: String,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Canonical URL of the posting
    #[serde(default)]
    pub link: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Opaque source-specific fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl JobRecord {
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            link: link.into(),
            location: None,
            category: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Whether the record has a link it can be tracked by.
    pub fn is_trackable(&self) -> bool {
        !self.link.trim().is_empty()
    }

    /// Whether the record may be emitted by an extractor.
    pub fn is_valid(&self) -> bool {
        self.is_trackable() && !self.title.trim().is_empty()
    }

    /// Free-text description, if the source provided one.
    pub fn description(&self) -> Option<&str> {
        self.extra.get("description").and_then(Value::as_str)
    }

    /// Logo URL, if the source provided one.
    pub fn logo(&self) -> Option<&str> {
        self.extra.get("logo").and_then(Value::as_str)
    }

    /// Lower-cased title and description, for keyword matching.
    pub fn text_for_matching(&self) -> String {
        match self.description() {
            Some(description) => format!("{} {}", self.title, description).to_lowercase(),
            None => self.title.to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> JobRecord {
        JobRecord::new("stripe", "Software Engineer", "https://stripe.com/jobs/1")
            .with_location("Seattle")
            .with_category("Infrastructure")
    }

    #[test]
    fn test_validity() {
        assert!(sample_job().is_valid());
        assert!(!JobRecord::new("stripe", "Engineer", "  ").is_trackable());
        assert!(!JobRecord::new("stripe", "", "https://x").is_valid());
    }

    #[test]
    fn test_persisted_layout_uses_site_key() {
        let json = serde_json::to_value(sample_job()).unwrap();
        assert_eq!(json["site"], "stripe");
        assert!(json.get("source").is_none());
    }

    #[test]
    fn test_extra_fields_survive_round_trip() {
        let raw = r#"{
            "title": "SRE",
            "link": "https://atlassian.com/1",
            "site": "atlassian",
            "category": "Engineering",
            "locations": ["Remote - United States"]
        }"#;
        let job: JobRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(job.source, "atlassian");
        assert!(job.location.is_none());
        assert!(job.extra.contains_key("locations"));

        let back: JobRecord =
            serde_json::from_value(serde_json::to_value(&job).unwrap()).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_text_for_matching_includes_description() {
        let job = sample_job().with_extra("description", "Kubernetes PLATFORM team");
        assert_eq!(
            job.text_for_matching(),
            "software engineer kubernetes platform team"
        );
    }

    #[test]
    fn test_source_alias_accepted() {
        let raw = r#"{"source": "plaid", "title": "Eng", "link": "https://plaid.com/1"}"#;
        let job: JobRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(job.source, "plaid");
    }
}
