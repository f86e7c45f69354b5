//! Alert delivery.

mod dispatch;
mod smtp;

use async_trait::async_trait;

pub use dispatch::dispatch;
pub use dispatch::DispatchReport;
pub use smtp::SmtpMailer;

/// One outbound message to a single recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),
}

/// Trait for sending mail
///
/// This trait allows for mocking mail delivery for testing purposes
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, message: &Message) -> Result<(), DeliveryError>;
}

/// Mock mailer for testing
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockMailer {
    pub sent: std::sync::Mutex<Vec<Message>>,
    /// Recipients whose delivery fails
    pub failing: Vec<String>,
}

#[cfg(test)]
#[async_trait]
impl Mailer for MockMailer {
    async fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        if self.failing.contains(&message.to) {
            return Err(DeliveryError::Smtp(format!(
                "550 mailbox unavailable: {}",
                message.to
            )));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            sent: Default::default(),
            failing: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}
