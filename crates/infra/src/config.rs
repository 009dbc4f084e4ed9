use chrono_tz::Tz;
use std::str::FromStr;
use std::time::Duration;
use subtrack_domain::ReminderRules;
use tracing::{info, warn};

/// How reminders reach the subscription owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
}

impl FromStr for NotificationChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            "push" => Ok(Self::Push),
            _ => Err(s.to_string()),
        }
    }
}

/// Retry policy applied by the durable step runner to failing steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl StepRetryPolicy {
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Backoff before the attempt following `attempt`, doubling every time
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .map(|backoff| backoff.min(self.max_backoff))
            .unwrap_or(self.max_backoff)
    }
}

impl Default for StepRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(60 * 1000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub channel: NotificationChannel,
    /// Endpoint of the delivery gateway. Senders only log messages
    /// when this is not set.
    pub gateway_url: Option<String>,
    pub gateway_key: Option<String>,
    /// Address reminders are sent from
    pub sender_address: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Postgres connection string. In-memory repositories are used when absent.
    pub database_url: Option<String>,
    /// Timezone in which "same day" and "day has passed" are decided
    pub timezone: Tz,
    pub reminder_rules: ReminderRules,
    pub notification: NotificationConfig,
    pub step_retry: StepRetryPolicy,
    /// Re-drive runs that were still running when the process stopped
    pub recover_runs_on_startup: bool,
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T
where
    T: std::fmt::Debug,
{
    match std::env::var(key) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {:?}.",
                    key, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn new() -> Self {
        let port = parse_env("PORT", 5000);

        let database_url = std::env::var("DATABASE_URL").ok();
        if database_url.is_none() {
            warn!("Did not find DATABASE_URL environment variable. Reminder runs will not survive restarts.");
        }

        let timezone = parse_env("REMINDER_TIMEZONE", Tz::UTC);

        let gateway_url = std::env::var("NOTIFICATION_GATEWAY_URL").ok();
        if gateway_url.is_none() {
            info!("Did not find NOTIFICATION_GATEWAY_URL environment variable. Reminders will only be logged.");
        }
        let notification = NotificationConfig {
            channel: parse_env("NOTIFICATION_CHANNEL", NotificationChannel::Email),
            gateway_url,
            gateway_key: std::env::var("NOTIFICATION_GATEWAY_KEY").ok(),
            sender_address: std::env::var("NOTIFICATION_SENDER_ADDRESS")
                .unwrap_or_else(|_| "reminders@subtrack.local".into()),
        };

        let default_retry = StepRetryPolicy::default();
        let step_retry = StepRetryPolicy {
            max_attempts: parse_env("STEP_MAX_ATTEMPTS", default_retry.max_attempts).max(1),
            initial_backoff: Duration::from_millis(parse_env(
                "STEP_INITIAL_BACKOFF_MS",
                default_retry.initial_backoff.as_millis() as u64,
            )),
            max_backoff: Duration::from_millis(parse_env(
                "STEP_MAX_BACKOFF_MS",
                default_retry.max_backoff.as_millis() as u64,
            )),
        };

        Self {
            port,
            database_url,
            timezone,
            reminder_rules: ReminderRules::default(),
            notification,
            step_retry,
            recover_runs_on_startup: parse_env("RECOVER_RUNS_ON_STARTUP", true),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
