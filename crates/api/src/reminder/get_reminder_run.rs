use crate::error::SubtrackError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use subtrack_api_structs::get_reminder_run::*;
use subtrack_domain::{ReminderRun, RunStep, ID};
use subtrack_infra::SubtrackContext;

fn handle_error(e: UseCaseError) -> SubtrackError {
    match e {
        UseCaseError::NotFound(run_id) => SubtrackError::NotFound(format!(
            "The reminder run with id: {}, was not found.",
            run_id
        )),
        UseCaseError::StorageError => SubtrackError::InternalError,
    }
}

pub async fn get_reminder_run_controller(
    path: web::Path<PathParams>,
    ctx: web::Data<SubtrackContext>,
) -> Result<HttpResponse, SubtrackError> {
    let usecase = GetReminderRunUseCase {
        run_id: path.run_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|(run, steps)| HttpResponse::Ok().json(APIResponse::new(run, steps)))
        .map_err(handle_error)
}

#[derive(Debug)]
struct GetReminderRunUseCase {
    pub run_id: ID,
}

#[derive(Debug, PartialEq)]
enum UseCaseError {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetReminderRunUseCase {
    type Response = (ReminderRun, Vec<RunStep>);

    type Error = UseCaseError;

    const NAME: &'static str = "GetReminderRun";

    async fn execute(&mut self, ctx: &SubtrackContext) -> Result<Self::Response, Self::Error> {
        let run = match ctx.repos.reminder_runs.find(&self.run_id).await {
            Ok(Some(run)) => run,
            Ok(None) => return Err(UseCaseError::NotFound(self.run_id.clone())),
            Err(_) => return Err(UseCaseError::StorageError),
        };
        let steps = ctx
            .repos
            .run_steps
            .find_by_run(&run.id)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok((run, steps))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use subtrack_domain::RunStepState;

    #[actix_web::main]
    #[test]
    async fn returns_run_with_its_steps() {
        let ctx = SubtrackContext::create_inmemory();
        let run = ReminderRun::new(ID::new(), ctx.sys.now());
        ctx.repos.reminder_runs.insert(&run).await.unwrap();
        ctx.repos
            .run_steps
            .upsert(&RunStep::new(
                run.id.clone(),
                "get subscription",
                RunStepState::Completed {
                    output: serde_json::Value::Null,
                },
                ctx.sys.now(),
            ))
            .await
            .unwrap();

        let mut usecase = GetReminderRunUseCase {
            run_id: run.id.clone(),
        };
        let (found, steps) = usecase.execute(&ctx).await.unwrap();

        assert_eq!(found.id, run.id);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name, "get subscription");
    }

    #[actix_web::main]
    #[test]
    async fn rejects_unknown_run() {
        let ctx = SubtrackContext::create_inmemory();
        let mut usecase = GetReminderRunUseCase { run_id: ID::new() };

        let res = usecase.execute(&ctx).await;

        assert_eq!(res.unwrap_err(), UseCaseError::NotFound(usecase.run_id));
    }
}
