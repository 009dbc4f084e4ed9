mod notifier;

pub use notifier::{
    create_notification_sender, EmailSender, INotificationSender, PushSender, SmsSender,
};
