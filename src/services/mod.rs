//! Source extractors.
//!
//! Each external careers page is one [`SourceExtractor`]. Extractors fetch and
//! parse their own listing, apply their own inclusion rules, and return
//! de-duplicated records stamped with their source id:
//! - `stripe`, `plaid`: HTML listings
//! - `digitalocean`, `datadog`, `databricks`: Greenhouse JSON boards
//! - `atlassian`, `visa`: company JSON APIs

use async_trait::async_trait;

use crate::error::Result;
use crate::models::JobRecord;

mod atlassian;
mod databricks;
mod datadog;
mod digitalocean;
pub mod filters;
mod greenhouse;
mod plaid;
mod registry;
mod stripe;
mod visa;

pub use atlassian::AtlassianSource;
pub use databricks::DatabricksSource;
pub use datadog::DatadogSource;
pub use digitalocean::DigitalOceanSource;
pub use plaid::PlaidSource;
pub use registry::{SourceRegistry, builtin_extractor};
pub use stripe::StripeSource;
pub use visa::VisaSource;

/// Identifiers of the extractors shipped with the crate.
pub const BUILTIN_SOURCES: &[&str] = &[
    "stripe",
    "plaid",
    "digitalocean",
    "atlassian",
    "datadog",
    "databricks",
    "visa",
];

/// Produces the current listing of one source.
///
/// Implementations must stamp every record with [`SourceExtractor::id`],
/// drop records without a link or title, and never return two records with
/// the same link. Network and parse problems are errors, not empty results.
#[async_trait]
pub trait SourceExtractor: Send + Sync {
    /// Fixed identifier of this source.
    fn id(&self) -> &str;

    /// Fetch the current listing.
    async fn extract(&self) -> Result<Vec<JobRecord>>;
}
