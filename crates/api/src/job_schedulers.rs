use crate::reminder::send_reminders::SendRemindersUseCase;
use crate::shared::usecase::execute;
use subtrack_domain::{ReminderRun, RunStatus};
use subtrack_infra::SubtrackContext;
use tracing::{error, info};

/// Spawns `run` on the actix runtime. Sleeping runs only hold a timer.
pub fn start_reminder_run(ctx: SubtrackContext, run: ReminderRun) {
    actix_web::rt::spawn(async move {
        drive_reminder_run(&ctx, run).await;
    });
}

/// Executes the reminders of `run` and records how it ended.
#[tracing::instrument(name = "Reminder run", skip(ctx, run), fields(run_id = %run.id, subscription_id = %run.subscription_id))]
pub async fn drive_reminder_run(ctx: &SubtrackContext, mut run: ReminderRun) -> ReminderRun {
    let usecase = SendRemindersUseCase {
        run_id: run.id.clone(),
        subscription_id: run.subscription_id.clone(),
    };

    match execute(usecase, ctx).await {
        Ok(outcome) => {
            info!("Reminder run finished: {}", outcome.as_str());
            run.complete(outcome, ctx.sys.now());
        }
        Err(e) => {
            error!("Reminder run failed: {}", e);
            run.fail(e.to_string(), ctx.sys.now());
        }
    }

    if let Err(e) = ctx.repos.reminder_runs.save(&run).await {
        error!("Unable to record the result of reminder run {}: {:?}", run.id, e);
    }

    run
}

/// Runs that were still in progress when the process stopped
pub async fn find_interrupted_runs(ctx: &SubtrackContext) -> anyhow::Result<Vec<ReminderRun>> {
    ctx.repos.reminder_runs.find_by_status(RunStatus::Running).await
}

pub fn start_reminder_runs_recovery(ctx: SubtrackContext) {
    actix_web::rt::spawn(async move {
        let runs = match find_interrupted_runs(&ctx).await {
            Ok(runs) => runs,
            Err(e) => {
                error!("Unable to load interrupted reminder runs: {:?}", e);
                return;
            }
        };

        info!("Resuming {} interrupted reminder run(s)", runs.len());
        for run in runs {
            start_reminder_run(ctx.clone(), run);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Arc;
    use subtrack_domain::{
        Category, Currency, Frequency, RunOutcome, RunStepState, Subscription,
        SubscriptionOwner, SubscriptionStatus, ID,
    };
    use subtrack_infra::ManualSys;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()
    }

    fn setup() -> SubtrackContext {
        let mut ctx = SubtrackContext::create_inmemory();
        ctx.sys = Arc::new(ManualSys::new(start()));
        ctx
    }

    async fn insert_subscription(ctx: &SubtrackContext, email: &str) -> Subscription {
        let subscription = Subscription {
            id: Default::default(),
            name: "Spotify Family".into(),
            price: 16.99,
            currency: Currency::Eur,
            frequency: Frequency::Monthly,
            category: Category::Entertainment,
            payment_method: "Paypal".into(),
            status: SubscriptionStatus::Active,
            start_date: start() - Duration::days(28),
            renewal_date: start() + Duration::days(2),
            user: SubscriptionOwner {
                id: Default::default(),
                name: "Ola".into(),
                email: email.into(),
            },
        };
        ctx.repos.subscriptions.insert(&subscription).await.unwrap();
        subscription
    }

    #[actix_web::main]
    #[test]
    async fn records_outcome_of_finished_run() {
        let ctx = setup();
        let subscription = insert_subscription(&ctx, "ola@example.com").await;
        let run = ReminderRun::new(subscription.id.clone(), ctx.sys.now());
        ctx.repos.reminder_runs.insert(&run).await.unwrap();

        let run = drive_reminder_run(&ctx, run).await;

        let stored = ctx.repos.reminder_runs.find(&run.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Completed);
        assert_eq!(stored.outcome, Some(RunOutcome::FinalReminderSent));
        assert!(stored.error.is_none());
    }

    #[actix_web::main]
    #[test]
    async fn undeliverable_reminders_do_not_fail_the_run() {
        let ctx = setup();
        // The email sender refuses an empty recipient
        let subscription = insert_subscription(&ctx, "").await;
        let run = ReminderRun::new(subscription.id.clone(), ctx.sys.now());
        ctx.repos.reminder_runs.insert(&run).await.unwrap();

        drive_reminder_run(&ctx, run.clone()).await;

        let stored = ctx.repos.reminder_runs.find(&run.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Completed);
        assert_eq!(stored.outcome, Some(RunOutcome::RemindersExhausted));
        let steps = ctx.repos.run_steps.find_by_run(&run.id).await.unwrap();
        let given_up = steps
            .iter()
            .filter(|step| matches!(step.state, RunStepState::Failed { .. }))
            .map(|step| step.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            given_up,
            vec![
                "2 days before reminder",
                "1 day before reminder",
                "Final day reminder"
            ]
        );
    }

    #[actix_web::main]
    #[test]
    async fn only_running_runs_are_recovered() {
        let ctx = setup();
        let running = ReminderRun::new(ID::new(), ctx.sys.now());
        let mut completed = ReminderRun::new(ID::new(), ctx.sys.now());
        completed.complete(RunOutcome::SubscriptionNotFound, ctx.sys.now());
        ctx.repos.reminder_runs.insert(&running).await.unwrap();
        ctx.repos.reminder_runs.insert(&completed).await.unwrap();

        let interrupted = find_interrupted_runs(&ctx).await.unwrap();

        assert_eq!(interrupted.len(), 1);
        assert_eq!(interrupted[0].id, running.id);
    }
}
