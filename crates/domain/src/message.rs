use crate::{date::format_date, PlannedReminder, Subscription};
use chrono_tz::Tz;
use serde::Serialize;

/// Rendered content of a reminder, independent of how it is delivered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderMessage {
    pub subject: String,
    /// Short plain text variant for channels like SMS and push
    pub text: String,
    pub html: String,
}

fn days_left(days_before: u32) -> String {
    match days_before {
        0 => "today".into(),
        1 => "tomorrow".into(),
        n => format!("in {} days", n),
    }
}

/// Escapes text that is placed inside the html body
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl ReminderMessage {
    pub fn render(reminder: &PlannedReminder, subscription: &Subscription, tz: &Tz) -> Self {
        let when = days_left(reminder.days_before);
        let renewal_date = format_date(&subscription.renewal_date, tz);
        let price = subscription.price_description();

        let subject = format!(
            "📅 Reminder: Your {} Subscription Renews {}!",
            subscription.name, when
        );
        let text = format!(
            "Hi {}, your {} subscription renews {} ({}) for {}.",
            subscription.user.name, subscription.name, when, renewal_date, price
        );
        let html = format!(
            "<div style=\"font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6;\">\
             <p>Hello <strong>{user}</strong>,</p>\
             <p>Your <strong>{name}</strong> subscription is set to renew on <strong>{date}</strong> ({when}).</p>\
             <table>\
             <tr><td><strong>Plan:</strong></td><td>{name}</td></tr>\
             <tr><td><strong>Price:</strong></td><td>{price}</td></tr>\
             <tr><td><strong>Payment Method:</strong></td><td>{payment}</td></tr>\
             </table>\
             <p>If you'd like to make changes or cancel your subscription, please visit your account settings before the renewal date.</p>\
             </div>",
            user = escape_html(&subscription.user.name),
            name = escape_html(&subscription.name),
            date = renewal_date,
            when = when,
            price = escape_html(&price),
            payment = escape_html(&subscription.payment_method),
        );

        Self {
            subject,
            text,
            html,
        }
    }
}
