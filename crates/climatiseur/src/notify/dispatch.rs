use tracing::error;
use tracing::info;
use tracing::warn;

use super::DeliveryError;
use super::Mailer;
use super::Message;
use crate::engine::Alert;

/// What happened to each recipient of an alert
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempted: usize,
    pub delivered: Vec<String>,
    pub failed: Vec<(String, DeliveryError)>,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Log the alert (or "all's well") and, unless `dry_run`, mail it to every
/// recipient.
///
/// Each recipient is attempted independently: a failure is logged and the
/// remaining recipients are still sent to.
pub async fn dispatch(
    alert: Option<&Alert>,
    dry_run: bool,
    sender: &str,
    recipients: &[String],
    mailer: &dyn Mailer,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    let alert = match alert {
        Some(a) => a,
        None => {
            info!("all's well!");
            return report;
        }
    };

    info!("{}", alert.subject);
    info!("{}", alert.body);

    if dry_run {
        info!("Dry run, not sending to {} recipient(s)", recipients.len());
        return report;
    }

    if recipients.is_empty() {
        warn!("No notification recipients configured, alert only logged");
        return report;
    }

    for to in recipients {
        report.attempted += 1;

        let message = Message {
            to: to.clone(),
            from: sender.to_string(),
            subject: alert.subject.clone(),
            body: alert.body.clone(),
        };

        match mailer.deliver(&message).await {
            Ok(()) => {
                info!("Sent alert to {}", to);
                report.delivered.push(to.clone());
            }
            Err(e) => {
                error!("Failed to send alert to {}: {}", to, e);
                report.failed.push((to.clone(), e));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MockMailer;

    fn alert() -> Alert {
        Alert {
            subject: "Close the doors!  It's cold outside!".to_string(),
            body: "Why would you have the Garage Door open?".to_string(),
        }
    }

    fn recipients(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_no_alert_sends_nothing() {
        let mailer = MockMailer::new();
        let report = dispatch(
            None,
            false,
            "climatiseur@example.com",
            &recipients(&["me@example.com"]),
            &mailer,
        )
        .await;

        assert_eq!(report, DispatchReport::default());
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_alert_sent_to_every_recipient() {
        let mailer = MockMailer::new();
        let report = dispatch(
            Some(&alert()),
            false,
            "climatiseur@example.com",
            &recipients(&["a@example.com", "b@example.com"]),
            &mailer,
        )
        .await;

        assert_eq!(report.attempted, 2);
        assert!(report.all_delivered());

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[0],
            Message {
                to: "a@example.com".to_string(),
                from: "climatiseur@example.com".to_string(),
                subject: "Close the doors!  It's cold outside!".to_string(),
                body: "Why would you have the Garage Door open?".to_string(),
            }
        );
        assert_eq!(sent[1].to, "b@example.com");
    }

    #[tokio::test]
    async fn test_dry_run_never_calls_mailer() {
        let mailer = MockMailer::new();
        let report = dispatch(
            Some(&alert()),
            true,
            "climatiseur@example.com",
            &recipients(&["a@example.com"]),
            &mailer,
        )
        .await;

        assert_eq!(report.attempted, 0);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_block_others() {
        let mailer = MockMailer::failing_for(&["a@example.com"]);
        let report = dispatch(
            Some(&alert()),
            false,
            "climatiseur@example.com",
            &recipients(&["a@example.com", "b@example.com", "c@example.com"]),
            &mailer,
        )
        .await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, recipients(&["b@example.com", "c@example.com"]));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "a@example.com");
        assert!(!report.all_delivered());
    }

    #[tokio::test]
    async fn test_empty_recipient_list() {
        let mailer = MockMailer::new();
        let report = dispatch(
            Some(&alert()),
            false,
            "climatiseur@example.com",
            &[],
            &mailer,
        )
        .await;

        assert_eq!(report.attempted, 0);
        assert!(mailer.sent().is_empty());
    }
}
