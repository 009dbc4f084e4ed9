use super::{gateway::GatewayClient, INotificationSender};
use crate::config::NotificationChannel;
use chrono_tz::Tz;
use serde::Serialize;
use subtrack_domain::{PlannedReminder, ReminderMessage, Subscription};
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    html: String,
    /// Reminder label, for auditing on the gateway side
    tag: &'a str,
}

pub struct EmailSender {
    gateway: GatewayClient,
    from: String,
    timezone: Tz,
}

impl EmailSender {
    pub(super) fn new(gateway: GatewayClient, from: String, timezone: Tz) -> Self {
        Self {
            gateway,
            from,
            timezone,
        }
    }
}

#[async_trait::async_trait]
impl INotificationSender for EmailSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    async fn send(
        &self,
        recipient: &str,
        reminder: &PlannedReminder,
        subscription: &Subscription,
    ) -> anyhow::Result<()> {
        if recipient.trim().is_empty() {
            return Err(anyhow::anyhow!("Email recipient is required"));
        }
        let message = ReminderMessage::render(reminder, subscription, &self.timezone);
        let payload = EmailPayload {
            from: &self.from,
            to: recipient,
            subject: message.subject,
            html: message.html,
            tag: &reminder.label,
        };
        self.gateway.post("email", &payload).await?;
        info!("Email sent successfully: {} to {}", reminder.label, recipient);
        Ok(())
    }
}
