use crate::{
    shared::entity::{Entity, ID},
    PlannedReminder,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(anyhow::anyhow!("Unknown run status: {}", s)),
        }
    }
}

/// Why a reminder run ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunOutcome {
    SubscriptionNotFound,
    SubscriptionInactive,
    RenewalDatePassed,
    FinalReminderSent,
    /// Every rule was processed but the final day reminder never went out,
    /// e.g. because its day passed while the run was delayed or its
    /// delivery kept failing.
    RemindersExhausted,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionNotFound => "subscriptionNotFound",
            Self::SubscriptionInactive => "subscriptionInactive",
            Self::RenewalDatePassed => "renewalDatePassed",
            Self::FinalReminderSent => "finalReminderSent",
            Self::RemindersExhausted => "remindersExhausted",
        }
    }
}

impl std::str::FromStr for RunOutcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscriptionNotFound" => Ok(Self::SubscriptionNotFound),
            "subscriptionInactive" => Ok(Self::SubscriptionInactive),
            "renewalDatePassed" => Ok(Self::RenewalDatePassed),
            "finalReminderSent" => Ok(Self::FinalReminderSent),
            "remindersExhausted" => Ok(Self::RemindersExhausted),
            _ => Err(anyhow::anyhow!("Unknown run outcome: {}", s)),
        }
    }
}

/// One execution of the reminder schedule for a single `Subscription`.
/// Each trigger creates a new `ReminderRun` with its own id, and a run
/// that has left `RunStatus::Running` is never resumed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRun {
    pub id: ID,
    pub subscription_id: ID,
    pub status: RunStatus,
    pub outcome: Option<RunOutcome>,
    /// Last step failure when the run ended as `RunStatus::Failed`
    pub error: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl ReminderRun {
    pub fn new(subscription_id: ID, now: DateTime<Utc>) -> Self {
        Self {
            id: Default::default(),
            subscription_id,
            status: RunStatus::Running,
            outcome: None,
            error: None,
            created: now,
            updated: now,
        }
    }

    pub fn complete(&mut self, outcome: RunOutcome, now: DateTime<Utc>) {
        self.status = RunStatus::Completed;
        self.outcome = Some(outcome);
        self.error = None;
        self.updated = now;
    }

    pub fn fail(&mut self, error: String, now: DateTime<Utc>) {
        self.status = RunStatus::Failed;
        self.error = Some(error);
        self.updated = now;
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }
}

impl Entity<ID> for ReminderRun {
    fn id(&self) -> ID {
        self.id.clone()
    }
}

/// Persisted progress of a single durable step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RunStepState {
    /// A suspension point that has been entered but not yet woken up from
    Sleeping { wake_at: DateTime<Utc> },
    /// The step finished. For sleeps the output is the actual wake time.
    Completed { output: Value },
    /// The step was given up on after its last attempt
    Failed { error: String },
}

/// An entry in the step log of a `ReminderRun`, unique per `(run_id, name)`
#[derive(Debug, Clone, PartialEq)]
pub struct RunStep {
    pub run_id: ID,
    pub name: String,
    pub state: RunStepState,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl RunStep {
    pub fn new(
        run_id: ID,
        name: impl Into<String>,
        state: RunStepState,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id,
            name: name.into(),
            state,
            created: now,
            updated: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, RunStepState::Completed { .. })
    }
}

/// Stable names of the durable steps of a reminder run. Names must not
/// change between releases, otherwise runs in flight lose their progress.
#[derive(Debug, Clone, Copy)]
pub enum StepName<'a> {
    FetchSubscription,
    CheckRenewalDate,
    SleepUntil(&'a PlannedReminder),
    CheckStatus(&'a PlannedReminder),
    SendReminder(&'a PlannedReminder),
}

const FETCH_SUBSCRIPTION: &str = "get subscription";
const CHECK_RENEWAL_DATE: &str = "check renewal date";
const SLEEP_UNTIL_PREFIX: &str = "sleep until ";
const CHECK_STATUS_PREFIX: &str = "check status before ";

impl<'a> StepName<'a> {
    /// Send steps are named after the reminder label, so a label must never
    /// collide with the name of another step.
    pub fn is_reserved(label: &str) -> bool {
        label == FETCH_SUBSCRIPTION
            || label == CHECK_RENEWAL_DATE
            || label.starts_with(SLEEP_UNTIL_PREFIX)
            || label.starts_with(CHECK_STATUS_PREFIX)
    }
}

impl<'a> Display for StepName<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchSubscription => f.write_str(FETCH_SUBSCRIPTION),
            Self::CheckRenewalDate => f.write_str(CHECK_RENEWAL_DATE),
            Self::SleepUntil(reminder) => write!(f, "{}{}", SLEEP_UNTIL_PREFIX, reminder.label),
            Self::CheckStatus(reminder) => write!(f, "{}{}", CHECK_STATUS_PREFIX, reminder.label),
            Self::SendReminder(reminder) => f.write_str(&reminder.label),
        }
    }
}
