use super::{gateway::GatewayClient, INotificationSender};
use crate::config::NotificationChannel;
use chrono_tz::Tz;
use serde::Serialize;
use subtrack_domain::{PlannedReminder, ReminderMessage, Subscription};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SmsPayload<'a> {
    /// Contact the gateway resolves to a phone number
    to: &'a str,
    text: String,
    tag: &'a str,
}

pub struct SmsSender {
    gateway: GatewayClient,
    timezone: Tz,
}

impl SmsSender {
    pub(super) fn new(gateway: GatewayClient, timezone: Tz) -> Self {
        Self { gateway, timezone }
    }
}

#[async_trait::async_trait]
impl INotificationSender for SmsSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Sms
    }

    async fn send(
        &self,
        recipient: &str,
        reminder: &PlannedReminder,
        subscription: &Subscription,
    ) -> anyhow::Result<()> {
        let message = ReminderMessage::render(reminder, subscription, &self.timezone);
        let payload = SmsPayload {
            to: recipient,
            text: message.text,
            tag: &reminder.label,
        };
        self.gateway.post("sms", &payload).await
    }
}
