use crate::{APIResponse, BaseClient};
use reqwest::StatusCode;
use std::sync::Arc;
use subtrack_api_structs::*;
use subtrack_domain::ID;

#[derive(Clone)]
pub struct ReminderClient {
    base: Arc<BaseClient>,
}

impl ReminderClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    /// Starts a reminder run for the subscription and returns its id
    pub async fn trigger(
        &self,
        subscription_id: ID,
    ) -> APIResponse<trigger_subscription_reminders::APIResponse> {
        let body = trigger_subscription_reminders::RequestBody { subscription_id };
        self.base
            .post(
                body,
                "workflows/subscription/reminder".into(),
                StatusCode::CREATED,
            )
            .await
    }

    pub async fn get_run(&self, run_id: ID) -> APIResponse<get_reminder_run::APIResponse> {
        self.base
            .get(
                format!("workflows/subscription/reminder/{}", run_id),
                StatusCode::OK,
            )
            .await
    }
}
