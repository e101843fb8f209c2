//! Outbound mail seam.
//!
//! Ticket notices go through [`Mailer`]. Delivery failures never abort the
//! mutation that triggered them; callers turn them into warnings.

use crate::errors::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// One plain-text message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Sends mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one message.
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Mailer that only writes each message to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        info!(to = %mail.to, subject = %mail.subject, "Mail queued");
        Ok(())
    }
}

/// Sends `mail` and converts a failure into a warning message.
pub async fn deliver(mailer: &dyn Mailer, mail: OutgoingMail, warnings: &mut Vec<String>) {
    if let Err(e) = mailer.send(&mail).await {
        tracing::warn!(to = %mail.to, error = %e, "Mail delivery failed");
        warnings.push(format!("Mail to {} failed: {e}", mail.to));
    }
}
