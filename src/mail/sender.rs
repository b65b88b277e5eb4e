//! Mail transports.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};

use crate::config::{MailConfig, MailProvider};
use crate::errors::{Error, Result};

/// Outbound email delivery.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, to: &str, content: &str, subject: &str) -> Result<()>;
}

/// Build the sender selected by configuration
pub fn sender_from_config(config: &MailConfig) -> Result<std::sync::Arc<dyn MailSender>> {
    match config.provider {
        MailProvider::Log => Ok(std::sync::Arc::new(LogMailSender)),
        MailProvider::Http => Ok(std::sync::Arc::new(HttpMailSender::from_config(config)?)),
    }
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, to: &str, content: &str, subject: &str) -> Result<()> {
        info!(to = %to, subject = %subject, content_length = content.len(), "mail delivery skipped (log provider)");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    html_content: String,
}

/// Delivers mail through a Brevo-compatible JSON API.
#[derive(Debug, Clone)]
pub struct HttpMailSender {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    sender_email: String,
    sender_name: String,
}

impl HttpMailSender {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        sender_email: impl Into<String>,
        sender_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("confido-auth/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config_with_source("Failed to build mail HTTP client", Box::new(e)))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            sender_email: sender_email.into(),
            sender_name: sender_name.into(),
        })
    }

    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let api_url = config
            .api_url
            .clone()
            .ok_or_else(|| Error::config("Mail API URL is required for the http provider"))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("Mail API key is required for the http provider"))?;

        Self::new(
            api_url,
            api_key,
            config.sender_email.clone(),
            config.sender_name.clone(),
            config.timeout(),
        )
    }
}

fn is_success_status(status: u16) -> bool {
    (200..=299).contains(&status)
}

#[async_trait]
impl MailSender for HttpMailSender {
    #[instrument(skip(self, content), fields(api_url = %self.api_url))]
    async fn send(&self, to: &str, content: &str, subject: &str) -> Result<()> {
        let body = SendEmailBody {
            sender: EmailAddress {
                email: self.sender_email.clone(),
                name: Some(self.sender_name.clone()),
            },
            to: vec![EmailAddress { email: to.to_string(), name: None }],
            subject: subject.to_string(),
            html_content: content.to_string(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::mail(format!("Mail API request failed: {}", e)))?;

        let status = response.status().as_u16();
        if is_success_status(status) {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::mail(format!("Mail API rejected message (status={}): {}", status, body)))
    }
}
