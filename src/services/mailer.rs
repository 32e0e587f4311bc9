//! Outbound mail collaborator.
//!
//! Delivery is fire-and-forget from the caller's perspective; a failed send
//! never rolls back the operation that triggered it.

use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Default transport: writes the message to the log instead of delivering it.
/// Useful for development and tests; a real deployment swaps in an SMTP-backed
/// implementation.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    #[must_use]
    pub const fn new(from: String) -> Self {
        Self { from }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(from = %self.from, to = %to, subject = %subject, "Outbound mail: {body}");
        Ok(())
    }
}
