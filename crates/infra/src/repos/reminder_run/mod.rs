mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderRunRepo;
pub use postgres::PostgresReminderRunRepo;
use subtrack_domain::{ReminderRun, RunStatus, ID};

#[async_trait::async_trait]
pub trait IReminderRunRepo: Send + Sync {
    async fn insert(&self, run: &ReminderRun) -> anyhow::Result<()>;
    async fn save(&self, run: &ReminderRun) -> anyhow::Result<()>;
    async fn find(&self, run_id: &ID) -> anyhow::Result<Option<ReminderRun>>;
    async fn find_by_status(&self, status: RunStatus) -> anyhow::Result<Vec<ReminderRun>>;
}
