//! Alert delivery for newly discovered jobs.
//!
//! A cycle hands its [`CycleResult`] to exactly one [`NotificationSink`].
//! Sinks render a [`Digest`] and deliver it; a cycle with nothing new is a
//! no-op for every sink.

mod digest;
mod email;
mod log_sink;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::NotifyConfig;
use crate::pipeline::CycleResult;

pub use digest::Digest;
pub use email::EmailNotifier;
pub use log_sink::LogNotifier;

/// Consumes the new jobs of a whole cycle.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver an alert for `new_jobs`, keyed by source in registry order.
    async fn notify(&self, new_jobs: &CycleResult) -> Result<()>;

    /// Short channel name for logs (e.g. `"email"`).
    fn channel_name(&self) -> &str;
}

/// Build the sink described by the notify section.
///
/// Email is used when enabled and an SMTP host and sender are configured;
/// otherwise digests only go to the log.
pub fn sink_from_config(config: &NotifyConfig) -> Result<Arc<dyn NotificationSink>> {
    if config.enabled && config.email_ready() {
        let (Some(host), Some(from)) = (config.smtp_host.as_deref(), config.from.as_deref())
        else {
            return Ok(Arc::new(LogNotifier::new()));
        };
        let notifier = EmailNotifier::from_config(
            host,
            config.smtp_port,
            config.smtp_tls,
            from,
            &config.to,
        )?;
        return Ok(Arc::new(notifier));
    }

    if config.enabled {
        log::info!("Email is not configured; new jobs will only be logged");
    }
    Ok(Arc::new(LogNotifier::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_email_falls_back_to_log() {
        let sink = sink_from_config(&NotifyConfig::default()).unwrap();
        assert_eq!(sink.channel_name(), "log");
    }

    #[test]
    fn configured_email_builds_email_sink() {
        let config = NotifyConfig {
            smtp_host: Some("smtp.example.com".into()),
            from: Some("alerts@example.com".into()),
            to: vec!["me@example.com".into()],
            ..NotifyConfig::default()
        };
        let sink = sink_from_config(&config).unwrap();
        assert_eq!(sink.channel_name(), "email");
    }

    #[test]
    fn bad_recipient_is_an_error() {
        let config = NotifyConfig {
            smtp_host: Some("smtp.example.com".into()),
            from: Some("alerts@example.com".into()),
            to: vec!["nope".into()],
            ..NotifyConfig::default()
        };
        assert!(sink_from_config(&config).is_err());
    }
}
