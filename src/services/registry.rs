// src/services/registry.rs

//! Ordered, fixed set of source extractors.

use std::collections::HashSet;

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Config, SourcesConfig};

use super::{
    AtlassianSource, DatabricksSource, DatadogSource, DigitalOceanSource, PlaidSource,
    SourceExtractor, StripeSource, VisaSource,
};

/// Build a built-in extractor by id.
pub fn builtin_extractor(
    id: &str,
    client: &Client,
    config: &SourcesConfig,
) -> Option<Box<dyn SourceExtractor>> {
    let client = client.clone();
    let extractor: Box<dyn SourceExtractor> = match id {
        "stripe" => Box::new(StripeSource::new(client, config)),
        "plaid" => Box::new(PlaidSource::new(client, config)),
        "digitalocean" => Box::new(DigitalOceanSource::new(client, config)),
        "atlassian" => Box::new(AtlassianSource::new(client, config)),
        "datadog" => Box::new(DatadogSource::new(client, config)),
        "databricks" => Box::new(DatabricksSource::new(client, config)),
        "visa" => Box::new(VisaSource::new(client, config)),
        _ => return None,
    };
    Some(extractor)
}

/// The sources a cycle runs, in report order.
pub struct SourceRegistry {
    extractors: Vec<Box<dyn SourceExtractor>>,
}

impl SourceRegistry {
    /// Create a registry, rejecting an empty list and duplicate ids.
    pub fn new(extractors: Vec<Box<dyn SourceExtractor>>) -> Result<Self> {
        if extractors.is_empty() {
            return Err(AppError::config("Source registry is empty"));
        }

        let mut ids = HashSet::new();
        for extractor in &extractors {
            if !ids.insert(extractor.id().to_string()) {
                return Err(AppError::config(format!(
                    "Duplicate source id '{}' in registry",
                    extractor.id()
                )));
            }
        }

        Ok(Self { extractors })
    }

    /// Build the enabled built-in sources in configured order.
    pub fn from_config(config: &Config, client: Client) -> Result<Self> {
        let extractors = config
            .sources
            .enabled
            .iter()
            .map(|id| {
                builtin_extractor(id, &client, &config.sources)
                    .ok_or_else(|| AppError::config(format!("Unknown source '{}'", id)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(extractors)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SourceExtractor> {
        self.extractors.iter().map(|e| e.as_ref())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.extractors.iter().map(|e| e.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}
