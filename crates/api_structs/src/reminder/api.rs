use crate::dtos::ReminderRunDTO;
use serde::{Deserialize, Serialize};
use subtrack_domain::{ReminderRun, RunStep, ID};

pub mod trigger_subscription_reminders {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub subscription_id: ID,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub workflow_run_id: ID,
    }

    impl APIResponse {
        pub fn new(workflow_run_id: ID) -> Self {
            Self { workflow_run_id }
        }
    }
}

pub mod get_reminder_run {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub run_id: ID,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub run: ReminderRunDTO,
    }

    impl APIResponse {
        pub fn new(run: ReminderRun, steps: Vec<RunStep>) -> Self {
            Self {
                run: ReminderRunDTO::new(run, steps),
            }
        }
    }
}
