mod date;
mod message;
mod reminder;
mod run;
mod shared;
mod subscription;

pub use chrono_tz::Tz;
pub use date::{format_date, is_before_day, is_same_day};
pub use message::ReminderMessage;
pub use reminder::{compute_plan, InvalidReminderRules, PlannedReminder, ReminderRule, ReminderRules};
pub use run::{ReminderRun, RunOutcome, RunStatus, RunStep, RunStepState, StepName};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use subscription::{
    Category, Currency, Frequency, InvalidSubscription, NewSubscription, Subscription,
    SubscriptionOwner, SubscriptionStatus,
};
