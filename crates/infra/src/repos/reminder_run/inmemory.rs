use super::IReminderRunRepo;
use crate::repos::shared::inmemory_repo::*;
use std::sync::Mutex;
use subtrack_domain::{ReminderRun, RunStatus, ID};

pub struct InMemoryReminderRunRepo {
    runs: Mutex<Vec<ReminderRun>>,
}

impl InMemoryReminderRunRepo {
    pub fn new() -> Self {
        Self {
            runs: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IReminderRunRepo for InMemoryReminderRunRepo {
    async fn insert(&self, run: &ReminderRun) -> anyhow::Result<()> {
        insert(run, &self.runs);
        Ok(())
    }

    async fn save(&self, run: &ReminderRun) -> anyhow::Result<()> {
        save(run, &self.runs);
        Ok(())
    }

    async fn find(&self, run_id: &ID) -> anyhow::Result<Option<ReminderRun>> {
        Ok(find(run_id, &self.runs))
    }

    async fn find_by_status(&self, status: RunStatus) -> anyhow::Result<Vec<ReminderRun>> {
        Ok(find_by(&self.runs, |run| run.status == status))
    }
}
