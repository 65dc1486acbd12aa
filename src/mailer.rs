//! Digest delivery over SMTP.
//!
//! The lettre SMTP transport is blocking, so each send runs on Tokio's
//! blocking pool. There is no retry and exactly one recipient.

use crate::config::MailSettings;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Delivers a rendered digest.
pub trait SendDigest {
    async fn send(&self, subject: &str, html: &str) -> Result<(), Box<dyn Error>>;
}

/// SMTP submission with STARTTLS and login credentials.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    settings: MailSettings,
    host: String,
    port: u16,
}

impl SmtpMailer {
    pub fn new(settings: MailSettings, host: impl Into<String>, port: u16) -> Self {
        Self {
            settings,
            host: host.into(),
            port,
        }
    }

    /// Build the multipart message with a single HTML part.
    pub fn build_message(&self, subject: &str, html: &str) -> Result<Message, Box<dyn Error>> {
        let from = Mailbox::new(
            Some(self.settings.sender_name.clone()),
            self.settings.from.clone(),
        );
        let message = Message::builder()
            .from(from)
            .to(Mailbox::new(None, self.settings.to.clone()))
            .subject(subject)
            .multipart(MultiPart::mixed().singlepart(SinglePart::html(html.to_string())))?;
        Ok(message)
    }
}

impl SendDigest for SmtpMailer {
    #[instrument(level = "info", skip_all, fields(host = %self.host, port = self.port))]
    async fn send(&self, subject: &str, html: &str) -> Result<(), Box<dyn Error>> {
        let t0 = Instant::now();
        let message = self.build_message(subject, html)?;
        let creds = Credentials::new(
            self.settings.username.clone(),
            self.settings.password.clone(),
        );
        let host = self.host.clone();
        let port = self.port;

        tokio::task::spawn_blocking(move || -> Result<(), String> {
            let transport = SmtpTransport::starttls_relay(&host)
                .map_err(|e| e.to_string())?
                .port(port)
                .credentials(creds)
                .timeout(Some(Duration::from_secs(30)))
                .build();
            transport.send(&message).map_err(|e| e.to_string())?;
            Ok(())
        })
        .await??;

        info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Email sent");
        Ok(())
    }
}

/// Logs what would have been sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunMailer;

impl SendDigest for DryRunMailer {
    async fn send(&self, subject: &str, html: &str) -> Result<(), Box<dyn Error>> {
        info!(%subject, bytes = html.len(), "Dry run; email not sent");
        Ok(())
    }
}

/// The mailer selected at startup.
#[derive(Debug, Clone)]
pub enum Mailer {
    Smtp(SmtpMailer),
    DryRun(DryRunMailer),
}

impl SendDigest for Mailer {
    async fn send(&self, subject: &str, html: &str) -> Result<(), Box<dyn Error>> {
        match self {
            Mailer::Smtp(m) => m.send(subject, html).await,
            Mailer::DryRun(m) => m.send(subject, html).await,
        }
    }
}
