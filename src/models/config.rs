//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::BUILTIN_SOURCES;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client and timeout settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Which sources run, and their endpoints
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Seen-state persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Alert delivery
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Reconciliation safeguards
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// HTTP service settings
    #[serde(default)]
    pub server: ServerConfig,

    /// In-process scheduler
    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply environment variable overrides on top of file values.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn apply_env(&mut self) {
        let _ = dotenvy::dotenv();

        if let Ok(path) = std::env::var("JOBWATCH_SEEN_FILE") {
            self.storage.seen_file = path;
        }
        if let Ok(bucket) = std::env::var("S3_BUCKET") {
            self.storage.s3_bucket.get_or_insert(bucket);
        }
        if let Ok(host) = std::env::var("SMTP_HOST") {
            self.notify.smtp_host = Some(host);
        }
        if let Ok(sender) = std::env::var("ALERT_SENDER") {
            self.notify.from = Some(sender);
        }
        if let Ok(recipients) = std::env::var("ALERT_RECIPIENT") {
            self.notify.to = recipients
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.source_timeout_secs == 0 {
            return Err(AppError::validation("http.source_timeout_secs must be > 0"));
        }
        if self.sources.enabled.is_empty() {
            return Err(AppError::validation("sources.enabled is empty"));
        }
        for (i, id) in self.sources.enabled.iter().enumerate() {
            if !BUILTIN_SOURCES.contains(&id.as_str()) {
                return Err(AppError::validation(format!("Unknown source '{}'", id)));
            }
            if self.sources.enabled[..i].contains(id) {
                return Err(AppError::validation(format!("Source '{}' listed twice", id)));
            }
        }
        if self.storage.backend == StorageBackend::S3 && self.storage.s3_bucket.is_none() {
            return Err(AppError::validation(
                "storage.s3_bucket is required for the s3 backend",
            ));
        }
        if self.reconcile.max_drop_percent > 100 {
            return Err(AppError::validation(
                "reconcile.max_drop_percent must be within 0-100",
            ));
        }
        if self.notify.enabled && self.notify.email_ready() && self.notify.to.is_empty() {
            return Err(AppError::validation("notify.to has no recipients"));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Upper bound for one source's whole extraction
    #[serde(default = "defaults::source_timeout")]
    pub source_timeout_secs: u64,
}

impl HttpConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            source_timeout_secs: defaults::source_timeout(),
        }
    }
}

/// Source selection and endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Source identifiers to run, in report order
    #[serde(default = "defaults::enabled_sources")]
    pub enabled: Vec<String>,

    /// Titles containing any of these (case-insensitive) are skipped
    #[serde(default = "defaults::exclude_title_keywords")]
    pub exclude_title_keywords: Vec<String>,

    #[serde(default = "defaults::stripe_url")]
    pub stripe_url: String,

    #[serde(default = "defaults::plaid_url")]
    pub plaid_url: String,

    #[serde(default = "defaults::digitalocean_url")]
    pub digitalocean_url: String,

    #[serde(default = "defaults::atlassian_url")]
    pub atlassian_url: String,

    #[serde(default = "defaults::datadog_url")]
    pub datadog_url: String,

    #[serde(default = "defaults::databricks_url")]
    pub databricks_url: String,

    #[serde(default = "defaults::visa_url")]
    pub visa_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled_sources(),
            exclude_title_keywords: defaults::exclude_title_keywords(),
            stripe_url: defaults::stripe_url(),
            plaid_url: defaults::plaid_url(),
            digitalocean_url: defaults::digitalocean_url(),
            atlassian_url: defaults::atlassian_url(),
            datadog_url: defaults::datadog_url(),
            databricks_url: defaults::databricks_url(),
            visa_url: defaults::visa_url(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    S3,
}

/// Seen-state persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// JSON file holding the seen state (local backend)
    #[serde(default = "defaults::seen_file")]
    pub seen_file: String,

    #[serde(default)]
    pub s3_bucket: Option<String>,

    #[serde(default = "defaults::s3_key")]
    pub s3_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            seen_file: defaults::seen_file(),
            s3_bucket: None,
            s3_key: defaults::s3_key(),
        }
    }
}

/// Email alert settings.
///
/// SMTP credentials are read from `SMTP_USERNAME` / `SMTP_PASSWORD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "defaults::notify_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub smtp_host: Option<String>,

    #[serde(default)]
    pub smtp_port: Option<u16>,

    #[serde(default)]
    pub smtp_tls: Option<bool>,

    /// Sender address
    #[serde(default)]
    pub from: Option<String>,

    /// Recipient addresses
    #[serde(default)]
    pub to: Vec<String>,
}

impl NotifyConfig {
    /// Whether enough is configured to send email.
    pub fn email_ready(&self) -> bool {
        self.smtp_host.is_some() && self.from.is_some()
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::notify_enabled(),
            smtp_host: None,
            smtp_port: None,
            smtp_tls: None,
            from: None,
            to: Vec::new(),
        }
    }
}

/// Safeguard against scrapes that silently come back empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Treat a collapsed listing as an extraction failure
    #[serde(default)]
    pub guard_empty_scrape: bool,

    /// Maximum allowed drop percentage (0-100)
    #[serde(default = "defaults::max_drop_percent")]
    pub max_drop_percent: u8,

    /// Below this many previously known jobs only an empty result is rejected
    #[serde(default = "defaults::min_baseline")]
    pub min_baseline: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            guard_empty_scrape: false,
            max_drop_percent: defaults::max_drop_percent(),
            min_baseline: defaults::min_baseline(),
        }
    }
}

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::host")]
    pub host: String,

    #[serde(default = "defaults::port")]
    pub port: u16,

    /// How long a cycle result is served before `/jobs` triggers a new cycle
    #[serde(default = "defaults::cache_ttl")]
    pub cache_ttl_secs: u64,

    #[serde(default = "defaults::cors_origins")]
    pub cors_origins: Vec<String>,

    /// Keywords for the top jobs view
    #[serde(default = "defaults::top_keywords")]
    pub top_keywords: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            cache_ttl_secs: defaults::cache_ttl(),
            cors_origins: defaults::cors_origins(),
            top_keywords: defaults::top_keywords(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between scheduled cycles (0 disables)
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl ScheduleConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Optional log file, also served by `/logs`
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            file: None,
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; JobAlertBot/1.0; +https://example.com/)".into()
    }
    pub fn timeout() -> u64 {
        15
    }
    pub fn source_timeout() -> u64 {
        60
    }

    // Source defaults
    pub fn enabled_sources() -> Vec<String> {
        vec![
            "stripe".into(),
            "plaid".into(),
            "digitalocean".into(),
            "atlassian".into(),
        ]
    }
    pub fn exclude_title_keywords() -> Vec<String> {
        [
            "PhD",
            "Senior",
            "Staff",
            "Product",
            "Program",
            "Manager",
            "Principal",
            "Director",
            "Principle",
            "Head",
            "Distinguished",
            "Marketing",
            "Accounting",
            "Salesforce",
            "Account",
            "CTO",
            "Sr",
        ]
        .iter()
        .map(|k| k.to_string())
        .collect()
    }
    pub fn stripe_url() -> String {
        concat!(
            "https://stripe.com/jobs/search?teams=Infrastructure+%26+Corporate+Tech&teams=University",
            "&office_locations=North+America--Atlanta",
            "&office_locations=North+America--Chicago",
            "&office_locations=North+America--New+York",
            "&office_locations=North+America--New+York+Privy+HQ",
            "&office_locations=North+America--San+Francisco+Bridge+HQ",
            "&office_locations=North+America--Seattle",
            "&office_locations=North+America--South+San+Francisco",
            "&office_locations=North+America--Washington+DC"
        )
        .into()
    }
    pub fn plaid_url() -> String {
        "https://plaid.com/careers/?department=Engineering#search".into()
    }
    pub fn digitalocean_url() -> String {
        "https://api.greenhouse.io/v1/boards/digitalocean98/embed/departments".into()
    }
    pub fn atlassian_url() -> String {
        "https://www.atlassian.com/endpoint/careers/listings".into()
    }
    pub fn datadog_url() -> String {
        "https://api.greenhouse.io/v1/boards/datadog/jobs".into()
    }
    pub fn databricks_url() -> String {
        "https://www.databricks.com/careers-assets/page-data/company/careers/open-positions/page-data.json".into()
    }
    pub fn visa_url() -> String {
        "https://search.visa.com/CAREERS/careers/jobs?q=".into()
    }

    // Storage defaults
    pub fn seen_file() -> String {
        "data/jobs-seen.json".into()
    }
    pub fn s3_key() -> String {
        "jobwatch/jobs-seen.json".into()
    }

    pub fn notify_enabled() -> bool {
        true
    }

    // Guard defaults
    pub fn max_drop_percent() -> u8 {
        50
    }
    pub fn min_baseline() -> usize {
        10
    }

    // Server defaults
    pub fn host() -> String {
        "0.0.0.0".into()
    }
    pub fn port() -> u16 {
        8000
    }
    pub fn cache_ttl() -> u64 {
        60
    }
    pub fn cors_origins() -> Vec<String> {
        vec!["http://localhost:3000".into()]
    }
    pub fn top_keywords() -> Vec<String> {
        ["devops", "site reliability", "sre", "platform", "infrastructure"]
            .iter()
            .map(|k| k.to_string())
            .collect()
    }

    pub fn interval() -> u64 {
        8 * 60 * 60
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
