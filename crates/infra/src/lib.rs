mod config;
mod durable;
mod repos;
mod services;
mod system;

pub use config::{Config, NotificationChannel, NotificationConfig, StepRetryPolicy};
pub use durable::DurableStepRunner;
pub use repos::{IReminderRunRepo, IRunStepRepo, ISubscriptionRepo, Repos};
pub use services::*;
use std::sync::Arc;
pub use system::{ISys, ManualSys, RealSys};
use tracing::info;

#[derive(Clone)]
pub struct SubtrackContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub notifier: Arc<dyn INotificationSender>,
}

impl SubtrackContext {
    fn new(repos: Repos, config: Config) -> Self {
        let notifier = create_notification_sender(&config.notification, config.timezone);
        Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            notifier,
        }
    }

    /// Context backed by in-memory repositories. Runs are lost on restart.
    pub fn create_inmemory() -> Self {
        Self::new(Repos::create_inmemory(), Config::new())
    }

    /// Step runner that records the steps of `run_id` in this context's step log
    pub fn step_runner(&self, run_id: subtrack_domain::ID) -> DurableStepRunner {
        DurableStepRunner::new(
            run_id,
            self.repos.run_steps.clone(),
            self.sys.clone(),
            self.config.step_retry,
        )
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<SubtrackContext> {
    let config = Config::new();
    let repos = match &config.database_url {
        Some(database_url) => Repos::create_postgres(database_url).await?,
        None => {
            info!("Using in-memory repositories");
            Repos::create_inmemory()
        }
    };

    Ok(SubtrackContext::new(repos, config))
}
