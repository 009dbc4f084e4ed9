use crate::shared::usecase::UseCase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtrack_domain::{
    compute_plan, is_before_day, is_same_day, RunOutcome, StepName, Subscription,
    SubscriptionStatus, ID,
};
use subtrack_infra::SubtrackContext;
use thiserror::Error;
use tracing::{info, warn};

/// Drives the reminders of one subscription from the first planned
/// reminder until the final day reminder has been delivered.
///
/// Every side effect and every read of the clock happens inside a durable
/// step of run `run_id`, so executing this again for the same run after an
/// interruption replays what already happened and continues where it stopped.
///
/// The subscription status is read again before every reminder, so a
/// subscription cancelled while the run sleeps gets no further reminders.
/// A reminder that cannot be delivered after all attempts is given up on
/// and the run goes on with the next one.
#[derive(Debug)]
pub struct SendRemindersUseCase {
    pub run_id: ID,
    pub subscription_id: ID,
}

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("Subscription state could not be read or recorded: {0:#}")]
    StoreFailure(anyhow::Error),
}

/// Captured once per run so that replays compare against the same `now`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenewalSnapshot {
    renewal_date: DateTime<Utc>,
    now: DateTime<Utc>,
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendRemindersUseCase {
    type Response = RunOutcome;

    type Error = UseCaseError;

    const NAME: &'static str = "SendReminders";

    async fn execute(&mut self, ctx: &SubtrackContext) -> Result<Self::Response, Self::Error> {
        let runner = ctx.step_runner(self.run_id.clone());
        let tz = &ctx.config.timezone;
        let sys = &ctx.sys;

        let subscriptions = &ctx.repos.subscriptions;
        let subscription_id = &self.subscription_id;
        let subscription: Option<Subscription> = runner
            .run_step(&StepName::FetchSubscription.to_string(), || async move {
                subscriptions.find(subscription_id).await
            })
            .await
            .map_err(UseCaseError::StoreFailure)?;

        let subscription = match subscription {
            Some(subscription) => subscription,
            None => {
                info!(
                    "Subscription {} was not found, stopping reminders",
                    self.subscription_id
                );
                return Ok(RunOutcome::SubscriptionNotFound);
            }
        };

        if !subscription.is_active() {
            info!(
                "Subscription {} is {}, stopping reminders",
                subscription.id,
                subscription.status.as_str()
            );
            return Ok(RunOutcome::SubscriptionInactive);
        }

        let renewal_date = subscription.renewal_date;
        let snapshot: RenewalSnapshot = runner
            .run_step(&StepName::CheckRenewalDate.to_string(), || async move {
                Ok(RenewalSnapshot {
                    renewal_date,
                    now: sys.now(),
                })
            })
            .await
            .map_err(UseCaseError::StoreFailure)?;

        if is_before_day(&snapshot.renewal_date, &snapshot.now, tz) {
            info!(
                "Renewal date of subscription {} has passed, stopping reminders",
                subscription.id
            );
            return Ok(RunOutcome::RenewalDatePassed);
        }

        let plan = compute_plan(snapshot.renewal_date, &ctx.config.reminder_rules);
        let mut now = snapshot.now;
        let notifier = &ctx.notifier;
        let subscription = &subscription;

        for reminder in &plan {
            if now < reminder.remind_at {
                now = runner
                    .sleep_until(
                        &StepName::SleepUntil(reminder).to_string(),
                        reminder.remind_at,
                    )
                    .await
                    .map_err(UseCaseError::StoreFailure)?;
            }

            // Reminders are only delivered on their own day, a missed day is not caught up
            if !is_same_day(&now, &reminder.remind_at, tz) {
                info!(
                    "Skipping `{}` for subscription {}, its day has passed",
                    reminder.label, subscription.id
                );
                continue;
            }

            let status: Option<SubscriptionStatus> = runner
                .run_step(&StepName::CheckStatus(reminder).to_string(), || async move {
                    let current = subscriptions.find(subscription_id).await;
                    current.map(|found| found.map(|subscription| subscription.status))
                })
                .await
                .map_err(UseCaseError::StoreFailure)?;
            match status {
                None => {
                    info!(
                        "Subscription {} was removed, stopping reminders",
                        subscription.id
                    );
                    return Ok(RunOutcome::SubscriptionNotFound);
                }
                Some(status) if status != SubscriptionStatus::Active => {
                    info!(
                        "Subscription {} is now {}, stopping reminders",
                        subscription.id,
                        status.as_str()
                    );
                    return Ok(RunOutcome::SubscriptionInactive);
                }
                Some(_) => {}
            }

            let send_step = StepName::SendReminder(reminder).to_string();
            let sent_at: Option<DateTime<Utc>> = runner
                .run_step_or_give_up(&send_step, || async move {
                    notifier
                        .send(&subscription.user.email, reminder, subscription)
                        .await?;
                    Ok::<_, anyhow::Error>(sys.now())
                })
                .await
                .map_err(UseCaseError::StoreFailure)?;

            if sent_at.is_none() {
                warn!(
                    "`{}` for subscription {} could not be delivered, continuing with the next reminder",
                    reminder.label, subscription.id
                );
                continue;
            }

            if reminder.is_final() {
                info!(
                    "Final day reminder for subscription {} sent",
                    subscription.id
                );
                return Ok(RunOutcome::FinalReminderSent);
            }
        }

        Ok(RunOutcome::RemindersExhausted)
    }
}
