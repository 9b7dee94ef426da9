//! SMTP email notifier via `lettre`.
//!
//! Port 465 uses implicit TLS; other ports use STARTTLS unless TLS is turned
//! off. Credentials come from `SMTP_USERNAME` / `SMTP_PASSWORD`.

use async_trait::async_trait;
use chrono::Local;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::{AppError, Result};
use crate::notify::{Digest, NotificationSink};
use crate::pipeline::CycleResult;

const CHANNEL: &str = "email";

/// Sends the cycle digest as an email.
#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailNotifier {
    pub fn from_config(
        smtp_host: &str,
        smtp_port: Option<u16>,
        tls: Option<bool>,
        from: &str,
        to: &[String],
    ) -> Result<Self> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| AppError::config(format!("Invalid sender '{}': {}", from, e)))?;

        let to = to
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>()
                    .map_err(|e| AppError::config(format!("Invalid recipient '{}': {}", addr, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        if to.is_empty() {
            return Err(AppError::config("at least one alert recipient is required"));
        }

        let port = smtp_port.unwrap_or(587);
        let mut builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
                .map_err(|e| AppError::config(e.to_string()))?
                .port(port)
        } else if tls.unwrap_or(true) {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .map_err(|e| AppError::config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host).port(port)
        };

        if let (Ok(username), Ok(password)) =
            (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn message(&self, digest: &Digest) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(digest.subject.clone());
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        builder
            .body(digest.body.clone())
            .map_err(|e| AppError::notify(CHANNEL, e))
    }
}

#[async_trait]
impl NotificationSink for EmailNotifier {
    async fn notify(&self, new_jobs: &CycleResult) -> Result<()> {
        let Some(digest) = Digest::from_cycle(new_jobs, Local::now().naive_local()) else {
            log::info!("No new jobs to email.");
            return Ok(());
        };

        let email = self.message(&digest)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::notify(CHANNEL, e))?;

        log::info!(
            "Sent email with {} total new jobs to {} recipient(s)",
            digest.total_new,
            self.to.len()
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        CHANNEL
    }
}
