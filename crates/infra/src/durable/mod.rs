//! Durable execution of reminder runs.
//!
//! Every step of a run is recorded in the step log under a stable name.
//! Re-entering a run after a restart replays completed steps from the log
//! instead of executing them again, and resumes pending sleeps with the
//! wake up time that was recorded when the sleep started.

use crate::{config::StepRetryPolicy, repos::IRunStepRepo, system::ISys};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use subtrack_domain::{RunStep, RunStepState, ID};
use tracing::{error, info, warn};

pub struct DurableStepRunner {
    run_id: ID,
    steps: Arc<dyn IRunStepRepo>,
    sys: Arc<dyn ISys>,
    retry: StepRetryPolicy,
}

impl DurableStepRunner {
    pub fn new(
        run_id: ID,
        steps: Arc<dyn IRunStepRepo>,
        sys: Arc<dyn ISys>,
        retry: StepRetryPolicy,
    ) -> Self {
        Self {
            run_id,
            steps,
            sys,
            retry,
        }
    }

    /// Executes `step` at most once per successful completion. A completed
    /// step returns its recorded output without calling `step` again.
    ///
    /// Failures are retried according to the `StepRetryPolicy`. Nothing is
    /// recorded for a failed step, so it is executed again on re-entry.
    pub async fn run_step<T, F, Fut>(&self, name: &str, step: F) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(recorded) = self.find_step(name).await? {
            return match recorded.state {
                RunStepState::Completed { output } => Self::recorded_output(name, output),
                RunStepState::Sleeping { .. } => Err(anyhow::anyhow!(
                    "Step `{}` is recorded as a sleep and cannot be run",
                    name
                )),
                RunStepState::Failed { error } => Err(anyhow::anyhow!(
                    "Step `{}` was given up on: {}",
                    name,
                    error
                )),
            };
        }

        let output = self.attempt(name, step).await?;
        self.record_completed(name, &output).await?;

        Ok(output)
    }

    /// Like `run_step`, but once the `StepRetryPolicy` is exhausted the step
    /// is recorded as `Failed` and `None` is returned so that the run can go
    /// on. Replaying a given up step returns `None` without executing it.
    ///
    /// Only errors of the step log itself are returned.
    pub async fn run_step_or_give_up<T, F, Fut>(
        &self,
        name: &str,
        step: F,
    ) -> anyhow::Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(recorded) = self.find_step(name).await? {
            return match recorded.state {
                RunStepState::Completed { output } => {
                    Self::recorded_output(name, output).map(Some)
                }
                RunStepState::Failed { .. } => Ok(None),
                RunStepState::Sleeping { .. } => Err(anyhow::anyhow!(
                    "Step `{}` is recorded as a sleep and cannot be run",
                    name
                )),
            };
        }

        match self.attempt(name, step).await {
            Ok(output) => {
                self.record_completed(name, &output).await?;
                Ok(Some(output))
            }
            Err(e) => {
                error!("Giving up on step `{}` of run {}: {:?}", name, self.run_id, e);
                let state = RunStepState::Failed {
                    error: format!("{:#}", e),
                };
                let step = RunStep::new(self.run_id.clone(), name, state, self.sys.now());
                self.steps
                    .upsert(&step)
                    .await
                    .with_context(|| format!("Unable to record failure of step `{}`", name))?;
                Ok(None)
            }
        }
    }

    async fn attempt<T, F, Fut>(&self, name: &str, mut step: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match step().await {
                Ok(output) => return Ok(output),
                Err(e) if self.retry.should_retry(attempt) => {
                    let backoff = self.retry.backoff(attempt);
                    warn!(
                        "Step `{}` of run {} failed on attempt {}, retrying in {:?}: {:?}",
                        name, self.run_id, attempt, backoff, e
                    );
                    let retry_at = self.sys.now()
                        + chrono::Duration::from_std(backoff)
                            .unwrap_or_else(|_| chrono::Duration::zero());
                    self.sys.sleep_until(retry_at).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e.context(format!(
                        "Step `{}` failed after {} attempt(s)",
                        name, attempt
                    )))
                }
            }
        }
    }

    async fn record_completed<T: Serialize>(&self, name: &str, output: &T) -> anyhow::Result<()> {
        let state = RunStepState::Completed {
            output: serde_json::to_value(output)?,
        };
        let step = RunStep::new(self.run_id.clone(), name, state, self.sys.now());
        self.steps
            .upsert(&step)
            .await
            .with_context(|| format!("Unable to record completion of step `{}`", name))
    }

    fn recorded_output<T: DeserializeOwned>(name: &str, output: Value) -> anyhow::Result<T> {
        serde_json::from_value(output)
            .with_context(|| format!("Recorded output of step `{}` is malformed", name))
    }

    /// Suspends the run until `wake_at` and returns the time it actually
    /// woke up at.
    ///
    /// The suspension point is recorded before sleeping. Re-entering a
    /// pending sleep waits for the originally recorded wake up time, and
    /// re-entering a finished sleep returns its recorded wake time at once.
    pub async fn sleep_until(
        &self,
        name: &str,
        wake_at: DateTime<Utc>,
    ) -> anyhow::Result<DateTime<Utc>> {
        let wake_at = match self.find_step(name).await? {
            Some(RunStep {
                state: RunStepState::Completed { output },
                ..
            }) => {
                return serde_json::from_value(output)
                    .with_context(|| format!("Recorded wake time of `{}` is malformed", name));
            }
            Some(RunStep {
                state: RunStepState::Sleeping { wake_at },
                ..
            }) => {
                info!(
                    "Resuming sleep `{}` of run {} until {}",
                    name, self.run_id, wake_at
                );
                wake_at
            }
            Some(RunStep {
                state: RunStepState::Failed { error },
                ..
            }) => {
                return Err(anyhow::anyhow!(
                    "Step `{}` is recorded as a failed step and cannot be slept on: {}",
                    name,
                    error
                ));
            }
            None => {
                let now = self.sys.now();
                let state = RunStepState::Sleeping { wake_at };
                self.steps
                    .upsert(&RunStep::new(self.run_id.clone(), name, state, now))
                    .await
                    .with_context(|| format!("Unable to record sleep `{}`", name))?;
                wake_at
            }
        };

        self.sys.sleep_until(wake_at).await;

        let woke_at = self.sys.now();
        let mut step = RunStep::new(
            self.run_id.clone(),
            name,
            RunStepState::Completed {
                output: serde_json::to_value(woke_at)?,
            },
            woke_at,
        );
        // Keep the time the sleep was entered
        if let Some(existing) = self.find_step(name).await? {
            step.created = existing.created;
        }
        self.steps
            .upsert(&step)
            .await
            .with_context(|| format!("Unable to record wake up from `{}`", name))?;

        Ok(woke_at)
    }

    async fn find_step(&self, name: &str) -> anyhow::Result<Option<RunStep>> {
        self.steps
            .find(&self.run_id, name)
            .await
            .with_context(|| format!("Unable to read step `{}` of run {}", name, self.run_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::ManualSys;
    use crate::SubtrackContext;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn retry_policy(max_attempts: u32) -> StepRetryPolicy {
        StepRetryPolicy {
            max_attempts,
            initial_backoff: StdDuration::from_secs(10),
            max_backoff: StdDuration::from_secs(60),
        }
    }

    fn runner(
        ctx: &SubtrackContext,
        run_id: &ID,
        sys: Arc<ManualSys>,
        max_attempts: u32,
    ) -> DurableStepRunner {
        DurableStepRunner::new(
            run_id.clone(),
            ctx.repos.run_steps.clone(),
            sys,
            retry_policy(max_attempts),
        )
    }

    #[tokio::test]
    async fn completed_step_is_replayed_without_executing_it_again() {
        let ctx = SubtrackContext::create_inmemory();
        let sys = Arc::new(ManualSys::new(start()));
        let run_id = ID::new();
        let calls = &AtomicUsize::new(0);

        for _ in 0..2 {
            // A fresh runner for the same run simulates re-entry after a restart
            let runner = runner(&ctx, &run_id, sys.clone(), 1);
            let res: String = runner
                .run_step("send", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("sent".to_string())
                })
                .await
                .expect("Step to succeed");
            assert_eq!(res, "sent");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_step_is_retried_with_backoff() {
        let ctx = SubtrackContext::create_inmemory();
        let sys = Arc::new(ManualSys::new(start()));
        let run_id = ID::new();
        let calls = &AtomicUsize::new(0);

        let runner = runner(&ctx, &run_id, sys.clone(), 3);
        let res: u32 = runner
            .run_step("flaky", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(anyhow::anyhow!("connection reset"))
                } else {
                    Ok(42)
                }
            })
            .await
            .expect("Step to succeed on the third attempt");

        assert_eq!(res, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 10s + 20s of backoff
        assert_eq!(sys.now(), start() + Duration::seconds(30));
    }

    #[tokio::test]
    async fn exhausted_step_is_not_recorded() {
        let ctx = SubtrackContext::create_inmemory();
        let sys = Arc::new(ManualSys::new(start()));
        let run_id = ID::new();
        let calls = &AtomicUsize::new(0);

        let runner = runner(&ctx, &run_id, sys.clone(), 2);
        let res: anyhow::Result<()> = runner
            .run_step("broken", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("gateway down"))
            })
            .await;

        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(ctx
            .repos
            .run_steps
            .find(&run_id, "broken")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn given_up_step_is_recorded_and_not_executed_again() {
        let ctx = SubtrackContext::create_inmemory();
        let sys = Arc::new(ManualSys::new(start()));
        let run_id = ID::new();
        let calls = &AtomicUsize::new(0);

        for _ in 0..2 {
            let res: Option<()> = runner(&ctx, &run_id, sys.clone(), 2)
                .run_step_or_give_up("deliver", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(anyhow::anyhow!("gateway down"))
                })
                .await
                .expect("Step log to work");
            assert!(res.is_none());
        }

        // Both attempts happen in the first pass only
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let step = ctx
            .repos
            .run_steps
            .find(&run_id, "deliver")
            .await
            .unwrap()
            .expect("Failure to be recorded");
        match step.state {
            RunStepState::Failed { error } => assert!(error.contains("gateway down")),
            state => panic!("Expected a failed step, got {:?}", state),
        }

        // A plain step with the same name does not run either
        let replayed: anyhow::Result<()> = runner(&ctx, &run_id, sys.clone(), 2)
            .run_step("deliver", || async { Ok(()) })
            .await;
        assert!(replayed.is_err());
    }

    #[tokio::test]
    async fn step_that_may_be_given_up_still_records_success() {
        let ctx = SubtrackContext::create_inmemory();
        let sys = Arc::new(ManualSys::new(start()));
        let run_id = ID::new();
        let calls = &AtomicUsize::new(0);

        for _ in 0..2 {
            let res: Option<u32> = runner(&ctx, &run_id, sys.clone(), 3)
                .run_step_or_give_up("deliver", || async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(anyhow::anyhow!("timeout"))
                    } else {
                        Ok(7)
                    }
                })
                .await
                .expect("Step log to work");
            assert_eq!(res, Some(7));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sleep_records_wake_time_and_replays_it() {
        let ctx = SubtrackContext::create_inmemory();
        let sys = Arc::new(ManualSys::new(start()));
        let run_id = ID::new();
        let wake_at = start() + Duration::days(2);

        let woke_at = runner(&ctx, &run_id, sys.clone(), 1)
            .sleep_until("nap", wake_at)
            .await
            .expect("To sleep");
        assert_eq!(woke_at, wake_at);

        // Much later, re-entering the sleep returns the recorded wake time
        sys.advance(Duration::days(5));
        let replayed = runner(&ctx, &run_id, sys.clone(), 1)
            .sleep_until("nap", wake_at)
            .await
            .expect("To replay sleep");
        assert_eq!(replayed, wake_at);
        assert_eq!(sys.now(), start() + Duration::days(7));
    }

    #[tokio::test]
    async fn pending_sleep_resumes_with_recorded_wake_time() {
        let ctx = SubtrackContext::create_inmemory();
        let sys = Arc::new(ManualSys::new(start()));
        let run_id = ID::new();
        let recorded_wake_at = start() + Duration::days(1);

        // The process stopped while this sleep was pending
        ctx.repos
            .run_steps
            .upsert(&RunStep::new(
                run_id.clone(),
                "nap",
                RunStepState::Sleeping {
                    wake_at: recorded_wake_at,
                },
                start(),
            ))
            .await
            .unwrap();

        let woke_at = runner(&ctx, &run_id, sys.clone(), 1)
            .sleep_until("nap", start() + Duration::days(3))
            .await
            .expect("To resume sleep");
        assert_eq!(woke_at, recorded_wake_at);

        let step = ctx
            .repos
            .run_steps
            .find(&run_id, "nap")
            .await
            .unwrap()
            .expect("Step to be recorded");
        assert!(step.is_completed());
        assert_eq!(step.created, start());
    }

    #[tokio::test]
    async fn sleep_in_the_past_wakes_immediately() {
        let ctx = SubtrackContext::create_inmemory();
        let sys = Arc::new(ManualSys::new(start()));
        let run_id = ID::new();

        let woke_at = runner(&ctx, &run_id, sys.clone(), 1)
            .sleep_until("late", start() - Duration::hours(1))
            .await
            .expect("To sleep");
        assert_eq!(woke_at, start());
    }
}
