use super::{gateway::GatewayClient, INotificationSender};
use crate::config::NotificationChannel;
use chrono_tz::Tz;
use serde::Serialize;
use subtrack_domain::{PlannedReminder, ReminderMessage, Subscription, ID};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushPayload<'a> {
    user_id: &'a ID,
    contact: &'a str,
    title: String,
    body: String,
    tag: &'a str,
}

pub struct PushSender {
    gateway: GatewayClient,
    timezone: Tz,
}

impl PushSender {
    pub(super) fn new(gateway: GatewayClient, timezone: Tz) -> Self {
        Self { gateway, timezone }
    }
}

#[async_trait::async_trait]
impl INotificationSender for PushSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Push
    }

    async fn send(
        &self,
        recipient: &str,
        reminder: &PlannedReminder,
        subscription: &Subscription,
    ) -> anyhow::Result<()> {
        let message = ReminderMessage::render(reminder, subscription, &self.timezone);
        let payload = PushPayload {
            user_id: &subscription.user.id,
            contact: recipient,
            title: message.subject,
            body: message.text,
            tag: &reminder.label,
        };
        self.gateway.post("push", &payload).await
    }
}
