mod email;
mod gateway;
mod push;
mod sms;

use crate::config::{NotificationChannel, NotificationConfig};
use chrono_tz::Tz;
pub use email::EmailSender;
use gateway::GatewayClient;
pub use push::PushSender;
pub use sms::SmsSender;
use std::sync::Arc;
use subtrack_domain::{PlannedReminder, Subscription};

/// Delivers a reminder to the owner of a `Subscription`.
///
/// Implementations are picked by configuration. The reminder label is
/// carried along for display and auditing only.
#[async_trait::async_trait]
pub trait INotificationSender: Send + Sync {
    fn channel(&self) -> NotificationChannel;

    /// Errors are transient from the caller's point of view and may be retried
    async fn send(
        &self,
        recipient: &str,
        reminder: &PlannedReminder,
        subscription: &Subscription,
    ) -> anyhow::Result<()>;
}

pub fn create_notification_sender(
    config: &NotificationConfig,
    timezone: Tz,
) -> Arc<dyn INotificationSender> {
    let gateway = GatewayClient::new(config.gateway_url.clone(), config.gateway_key.clone());
    match config.channel {
        NotificationChannel::Email => Arc::new(EmailSender::new(
            gateway,
            config.sender_address.clone(),
            timezone,
        )),
        NotificationChannel::Sms => Arc::new(SmsSender::new(gateway, timezone)),
        NotificationChannel::Push => Arc::new(PushSender::new(gateway, timezone)),
    }
}
