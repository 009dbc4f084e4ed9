use super::IRunStepRepo;
use crate::repos::shared::inmemory_repo::*;
use std::sync::Mutex;
use subtrack_domain::{RunStep, ID};

pub struct InMemoryRunStepRepo {
    steps: Mutex<Vec<RunStep>>,
}

impl InMemoryRunStepRepo {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IRunStepRepo for InMemoryRunStepRepo {
    async fn upsert(&self, step: &RunStep) -> anyhow::Result<()> {
        let updated = update_many(
            &self.steps,
            |s| s.run_id == step.run_id && s.name == step.name,
            |s| {
                s.state = step.state.clone();
                s.updated = step.updated;
            },
        );
        if updated == 0 {
            insert(step, &self.steps);
        }
        Ok(())
    }

    async fn find(&self, run_id: &ID, name: &str) -> anyhow::Result<Option<RunStep>> {
        Ok(find_by(&self.steps, |s| s.run_id == *run_id && s.name == name)
            .into_iter()
            .next())
    }

    async fn find_by_run(&self, run_id: &ID) -> anyhow::Result<Vec<RunStep>> {
        Ok(find_by(&self.steps, |s| s.run_id == *run_id))
    }
}
