use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtrack_domain::{ReminderRun, RunOutcome, RunStatus, RunStep, RunStepState, ID};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RunStepDTO {
    pub name: String,
    pub state: RunStepState,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl RunStepDTO {
    pub fn new(step: RunStep) -> Self {
        Self {
            name: step.name,
            state: step.state,
            created: step.created,
            updated: step.updated,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRunDTO {
    pub id: ID,
    pub subscription_id: ID,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub outcome: Option<RunOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub error: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub steps: Vec<RunStepDTO>,
}

impl ReminderRunDTO {
    pub fn new(run: ReminderRun, steps: Vec<RunStep>) -> Self {
        Self {
            id: run.id,
            subscription_id: run.subscription_id,
            status: run.status,
            outcome: run.outcome,
            error: run.error,
            created: run.created,
            updated: run.updated,
            steps: steps.into_iter().map(RunStepDTO::new).collect(),
        }
    }
}
