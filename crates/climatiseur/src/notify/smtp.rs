use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Tokio1Executor;
use tracing::debug;

use super::DeliveryError;
use super::Mailer;
use super::Message;
use crate::config::MailConfig;
use crate::config::MailSecurity;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Real mailer implementation using lettre's async SMTP transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Create a new SmtpMailer from configuration
    ///
    /// No connection is made until the first message is delivered.
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let builder = match config.security {
            MailSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            }
            MailSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
            MailSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
            }
        };

        let mut builder = builder.port(config.port).timeout(Some(SMTP_TIMEOUT));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address.parse().map_err(|e: lettre::address::AddressError| DeliveryError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Build the wire message: plain text, one recipient.
fn build_email(message: &Message) -> Result<lettre::Message, DeliveryError> {
    lettre::Message::builder()
        .from(parse_mailbox(&message.from)?)
        .to(parse_mailbox(&message.to)?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| DeliveryError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let email = build_email(message)?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| DeliveryError::Smtp(e.to_string()))?;

        debug!(
            "SMTP accepted message to {}: {}",
            message.to,
            response.code()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> Message {
        Message {
            to: to.to_string(),
            from: "Climatiseur <climatiseur@example.com>".to_string(),
            subject: "Close the doors!  It's hot outside!".to_string(),
            body: "Why would you have the Front Door open?".to_string(),
        }
    }

    #[test]
    fn test_build_email() {
        let email = build_email(&message("me@example.com")).unwrap();
        let formatted = String::from_utf8(email.formatted()).unwrap();

        assert!(formatted.contains("To: me@example.com"));
        assert!(formatted.contains("Subject: Close the doors!"));
        assert!(formatted.contains("It's hot outside!"));
        assert!(formatted.contains("Why would you have the Front Door open?"));
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let err = build_email(&message("not an address")).unwrap_err();
        assert!(matches!(err, DeliveryError::Address { ref address, .. } if address == "not an address"));
    }

    #[test]
    fn test_new_does_not_connect() {
        let config = MailConfig {
            host: "smtp.invalid".to_string(),
            port: 2525,
            username: Some("climatiseur".to_string()),
            password: Some("secret".to_string()),
            security: MailSecurity::None,
        };
        assert!(SmtpMailer::new(&config).is_ok());
    }
}
