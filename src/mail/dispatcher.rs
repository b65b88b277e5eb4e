//! Fire-and-forget delivery off the request path.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};

use crate::mail::MailSender;
use crate::observability::metrics;

/// A message waiting to be handed to the transport.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub content: String,
}

/// Spawns each delivery on the runtime with an upper bound on its duration.
/// Failures are logged and counted, never returned to the caller.
#[derive(Clone)]
pub struct MailDispatcher {
    sender: Arc<dyn MailSender>,
    timeout: Duration,
}

impl MailDispatcher {
    pub fn new(sender: Arc<dyn MailSender>, timeout: Duration) -> Self {
        Self { sender, timeout }
    }

    pub fn dispatch(&self, mail: OutgoingMail) -> JoinHandle<()> {
        let sender = self.sender.clone();
        let timeout = self.timeout;
        let span = tracing::info_span!("mail_dispatch", to = %mail.to, subject = %mail.subject);

        tokio::spawn(
            async move {
                match tokio::time::timeout(timeout, sender.send(&mail.to, &mail.content, &mail.subject))
                    .await
                {
                    Ok(Ok(())) => {
                        metrics::record_mail_delivery("sent");
                        info!("mail delivered");
                    }
                    Ok(Err(err)) => {
                        metrics::record_mail_delivery("failed");
                        error!(error = %err, "mail delivery failed");
                    }
                    Err(_) => {
                        metrics::record_mail_delivery("timeout");
                        warn!(timeout_ms = timeout.as_millis() as u64, "mail delivery timed out");
                    }
                }
            }
            .instrument(span),
        )
    }
}
