mod reminder_run;
mod run_step;
mod shared;
mod subscription;

pub use reminder_run::IReminderRunRepo;
use reminder_run::{InMemoryReminderRunRepo, PostgresReminderRunRepo};
pub use run_step::IRunStepRepo;
use run_step::{InMemoryRunStepRepo, PostgresRunStepRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use subscription::ISubscriptionRepo;
use subscription::{InMemorySubscriptionRepo, PostgresSubscriptionRepo};
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub subscriptions: Arc<dyn ISubscriptionRepo>,
    pub reminder_runs: Arc<dyn IReminderRunRepo>,
    pub run_steps: Arc<dyn IRunStepRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");

        sqlx::migrate!().run(&pool).await?;

        Ok(Self {
            subscriptions: Arc::new(PostgresSubscriptionRepo::new(pool.clone())),
            reminder_runs: Arc::new(PostgresReminderRunRepo::new(pool.clone())),
            run_steps: Arc::new(PostgresRunStepRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            subscriptions: Arc::new(InMemorySubscriptionRepo::new()),
            reminder_runs: Arc::new(InMemoryReminderRunRepo::new()),
            run_steps: Arc::new(InMemoryRunStepRepo::new()),
        }
    }
}
