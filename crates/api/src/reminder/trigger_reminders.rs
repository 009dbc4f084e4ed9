use crate::error::SubtrackError;
use crate::job_schedulers::start_reminder_run;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use subtrack_api_structs::trigger_subscription_reminders::*;
use subtrack_domain::{ReminderRun, ID};
use subtrack_infra::SubtrackContext;

pub async fn trigger_reminders_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<SubtrackContext>,
) -> Result<HttpResponse, SubtrackError> {
    let usecase = TriggerRemindersUseCase {
        subscription_id: body.0.subscription_id,
    };

    let run = execute(usecase, &ctx).await.map_err(SubtrackError::from)?;
    let run_id = run.id.clone();
    start_reminder_run(ctx.get_ref().clone(), run);

    Ok(HttpResponse::Created().json(APIResponse::new(run_id)))
}

/// Registers a new reminder run for a subscription. Every trigger starts a
/// fresh run with its own id, the subscription itself is only looked up
/// once the run is driven.
#[derive(Debug)]
pub struct TriggerRemindersUseCase {
    pub subscription_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

impl From<UseCaseError> for SubtrackError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for TriggerRemindersUseCase {
    type Response = ReminderRun;

    type Error = UseCaseError;

    const NAME: &'static str = "TriggerReminders";

    async fn execute(&mut self, ctx: &SubtrackContext) -> Result<Self::Response, Self::Error> {
        let run = ReminderRun::new(self.subscription_id.clone(), ctx.sys.now());

        ctx.repos
            .reminder_runs
            .insert(&run)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(run)
    }
}
