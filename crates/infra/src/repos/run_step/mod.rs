mod inmemory;
mod postgres;

pub use inmemory::InMemoryRunStepRepo;
pub use postgres::PostgresRunStepRepo;
use subtrack_domain::{RunStep, ID};

/// Step log of reminder runs, keyed by `(run_id, name)`
#[async_trait::async_trait]
pub trait IRunStepRepo: Send + Sync {
    /// Inserts the step or replaces the state of an existing step with the same key
    async fn upsert(&self, step: &RunStep) -> anyhow::Result<()>;
    async fn find(&self, run_id: &ID, name: &str) -> anyhow::Result<Option<RunStep>>;
    /// All steps of a run in the order they were first recorded
    async fn find_by_run(&self, run_id: &ID) -> anyhow::Result<Vec<RunStep>>;
}
