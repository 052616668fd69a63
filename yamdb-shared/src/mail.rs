/// Outbound email
///
/// Signup mails a confirmation code to the new account. Delivery goes through
/// the [`Mailer`] trait so the server can be wired to any transport:
///
/// - [`LogMailer`]: writes each message to the log (development default)
/// - [`MemoryMailer`]: keeps messages in memory for tests to inspect
///
/// # Example
///
/// ```
/// use yamdb_shared::mail::{confirmation_email, Mailer, MemoryMailer};
///
/// # async fn example() -> Result<(), yamdb_shared::mail::MailError> {
/// let mailer = MemoryMailer::new();
/// mailer
///     .send(confirmation_email("noreply@yamdb.local", "alice@example.com", "abc123"))
///     .await?;
/// assert_eq!(mailer.sent().len(), 1);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Subject line of confirmation code messages
pub const CONFIRMATION_SUBJECT: &str = "confirmation code";

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Transport refused or failed to deliver the message
    #[error("Failed to deliver email: {0}")]
    Delivery(String),
}

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Builds the message carrying a confirmation code
pub fn confirmation_email(from: &str, to: &str, code: &str) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: CONFIRMATION_SUBJECT.to_string(),
        body: format!("Your confirmation code: {code}"),
    }
}

/// Email transport
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one message
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

/// Logs messages instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Email sent"
        );
        Ok(())
    }
}

/// Records messages in memory
#[derive(Debug, Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<EmailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    /// The most recent message addressed to `to`
    pub fn last_to(&self, to: &str) -> Option<EmailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        self.outbox
            .lock()
            .map_err(|_| MailError::Delivery("outbox lock poisoned".to_string()))?
            .push(message);
        Ok(())
    }
}

/// Pulls the code back out of a confirmation message body
pub fn extract_code(message: &EmailMessage) -> Option<&str> {
    message
        .body
        .rsplit_once(": ")
        .map(|(_, code)| code.trim())
        .filter(|code| !code.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_email_shape() {
        let message = confirmation_email("noreply@yamdb.local", "bob@example.com", "XYZ");

        assert_eq!(message.subject, "confirmation code");
        assert_eq!(message.to, "bob@example.com");
        assert!(message.body.contains("XYZ"));
        assert_eq!(extract_code(&message), Some("XYZ"));
    }

    #[tokio::test]
    async fn test_memory_mailer_records_messages() {
        let mailer = MemoryMailer::new();
        mailer.send(confirmation_email("a@x", "one@x", "1")).await.unwrap();
        mailer.send(confirmation_email("a@x", "two@x", "2")).await.unwrap();
        mailer.send(confirmation_email("a@x", "one@x", "3")).await.unwrap();

        assert_eq!(mailer.sent().len(), 3);
        let last = mailer.last_to("one@x").unwrap();
        assert_eq!(extract_code(&last), Some("3"));
        assert!(mailer.last_to("nobody@x").is_none());
    }

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let result = LogMailer.send(confirmation_email("a@x", "b@x", "c")).await;
        assert!(result.is_ok());
    }
}
