// src/services/greenhouse.rs

//! Greenhouse job board payload shapes shared by several sources.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GreenhouseJob {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub absolute_url: Option<String>,

    #[serde(default)]
    pub location: Option<GreenhouseLocation>,

    #[serde(default)]
    pub metadata: Option<Vec<GreenhouseMetadata>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GreenhouseLocation {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GreenhouseMetadata {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GreenhouseDepartment {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub jobs: Vec<GreenhouseJob>,
}

impl GreenhouseJob {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default().trim()
    }

    pub fn link(&self) -> &str {
        self.absolute_url.as_deref().unwrap_or_default()
    }

    pub fn location_name(&self) -> &str {
        self.location
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .unwrap_or_default()
    }

    /// Metadata value by field name, rendered as trimmed text.
    ///
    /// Missing fields and nulls come back as an empty string.
    pub fn metadata_value(&self, name: &str) -> String {
        self.metadata
            .iter()
            .flatten()
            .find(|m| m.name.as_deref() == Some(name))
            .map(|m| match &m.value {
                Value::Null => String::new(),
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .unwrap_or_default()
    }
}
